/// Parameters Facebook sends back to the redirect URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackInput {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackInput {
    /// Builds the input from decoded `key=value` pairs. A repeated key keeps
    /// its first value; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut input = Self::default();

        for (key, value) in pairs {
            let slot = match key.as_str() {
                "code" => &mut input.code,
                "state" => &mut input.state,
                "error" => &mut input.error,
                "error_description" => &mut input.error_description,
                _ => continue,
            };
            slot.get_or_insert(value);
        }

        input
    }

    /// Fields present in `other` replace the ones in `self`.
    pub fn merge(self, other: CallbackInput) -> Self {
        Self {
            code: other.code.or(self.code),
            state: other.state.or(self.state),
            error: other.error.or(self.error),
            error_description: other.error_description.or(self.error_description),
        }
    }
}
