/// Maximum token length kept for indexing.
/// Longer runs of non-whitespace are likely base64 blobs or binary junk.
const MAX_TOKEN_LENGTH: usize = 256;

/// Split text on whitespace, keeping token order and duplicates
pub fn tokenize_whitespace(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|token| token.len() <= MAX_TOKEN_LENGTH)
        .map(str::to_string)
        .collect()
}

/// Lowercase every token in place
pub fn case_fold(tokens: &mut [String]) {
    for token in tokens.iter_mut() {
        if token.chars().any(char::is_uppercase) {
            *token = token.to_lowercase();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_tokens_keep_order_and_duplicates() {
        let tokens = tokenize_whitespace("the cat\tsat\n on  the mat");
        assert_eq!(tokens, vec!["the", "cat", "sat", "on", "the", "mat"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(tokenize_whitespace("").is_empty());
        assert!(tokenize_whitespace(" \n\t ").is_empty());
    }

    #[test]
    fn test_case_fold() {
        let mut tokens = tokenize_whitespace("The CAT sat Über");
        case_fold(&mut tokens);
        assert_eq!(tokens, vec!["the", "cat", "sat", "über"]);
    }

    #[test]
    fn test_overlong_tokens_dropped() {
        let long = "x".repeat(MAX_TOKEN_LENGTH + 1);
        let text = format!("a {} b", long);
        assert_eq!(tokenize_whitespace(&text), vec!["a", "b"]);
    }
}
