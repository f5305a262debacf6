/// Wrapper for a model token (ID). Using a newtype avoids accidental
/// mixing with positions and sequence ids, which are also `i32`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Token(pub i32);

// i32 matches llama.cpp's `llama_token`. Engines with other id types convert
// at their glue layer.

impl From<i32> for Token {
    #[inline]
    fn from(value: i32) -> Self {
        Token(value)
    }
}

impl From<Token> for i32 {
    #[inline]
    fn from(token: Token) -> i32 {
        token.0
    }
}
