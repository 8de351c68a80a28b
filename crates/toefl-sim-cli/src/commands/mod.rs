pub mod check;
pub mod init;
pub mod reading;
pub mod topics;
pub mod writing;

use std::io::{BufRead, Write};

use anyhow::Result;
use chrono::Utc;

use toefl_sim_core::session::SessionState;
use toefl_sim_core::timer::format_clock;

/// Print `label`, then read one line. `None` at end of input.
fn prompt_line<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// One-line clock for the running activity.
fn clock_line(state: &SessionState) -> String {
    let now = Utc::now();
    if state.is_timer_expired(now) {
        return "Time's up! You can still submit.".to_string();
    }
    match state.remaining_secs(now) {
        Some(secs) => format!("Time remaining: {}", format_clock(secs)),
        None => String::new(),
    }
}
