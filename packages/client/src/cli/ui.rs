//! UI utilities for the client.

use std::io::Write;

pub const PROMPT: &str = "canvas> ";

/// Print `text` and redisplay the prompt
pub fn print_with_prompt(text: &str) {
    print!("{}{}", text, PROMPT);
    std::io::stdout().flush().ok();
}
