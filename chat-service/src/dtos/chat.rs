use serde::{Deserialize, Serialize};

/// Name of the free-text query parameter.
pub const USER_INPUT_PARAM: &str = "user_input";

/// Query string accepted by `/palm2`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChatQuery {
    /// Free text from the page. Missing means empty.
    pub user_input: String,
}

impl ChatQuery {
    /// Build from decoded query pairs. The first `user_input` wins; repeats
    /// and unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let user_input = pairs
            .into_iter()
            .find(|(key, _)| key == USER_INPUT_PARAM)
            .map(|(_, value)| value)
            .unwrap_or_default();

        Self { user_input }
    }
}

/// Body returned by `/palm2`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatContent {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn first_user_input_wins() {
        let query = ChatQuery::from_pairs(pairs(&[("user_input", "a"), ("user_input", "b")]));
        assert_eq!(query.user_input, "a");
    }

    #[test]
    fn missing_user_input_is_empty() {
        let query = ChatQuery::from_pairs(pairs(&[("other", "1")]));
        assert_eq!(query, ChatQuery::default());
    }
}
