//! UI utilities for the client.

use std::io::Write;

/// Redisplay the prompt after printing output
pub fn redisplay_prompt(session_id: &str) {
    print!("{}> ", session_id);
    std::io::stdout().flush().ok();
}
