//! Small utility helpers used across modules.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the unix epoch; used for created/last-login stamps on
/// profile documents.
pub fn now_unix_secs() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs())
    .unwrap_or(0)
}

/// `m:ss` display form of a seconds counter (e.g. 125 -> "2:05").
pub fn format_mmss(total_secs: u64) -> String {
  let mins = total_secs / 60;
  let secs = total_secs % 60;
  format!("{}:{:02}", mins, secs)
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads; the cut
/// backs up to a char boundary since payloads are client-controlled.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mmss_pads_seconds() {
    assert_eq!(format_mmss(0), "0:00");
    assert_eq!(format_mmss(3), "0:03");
    assert_eq!(format_mmss(59), "0:59");
    assert_eq!(format_mmss(60), "1:00");
    assert_eq!(format_mmss(125), "2:05");
    assert_eq!(format_mmss(3600), "60:00");
  }

  #[test]
  fn now_is_after_2020() {
    assert!(now_unix_secs() > 1_577_836_800);
  }

  #[test]
  fn trunc_leaves_short_strings_alone() {
    assert_eq!(trunc_for_log("short", 10), "short");
  }

  #[test]
  fn trunc_cuts_long_strings_and_reports_size() {
    let out = trunc_for_log("abcdefghij", 4);
    assert!(out.starts_with("abcd"));
    assert!(out.contains("10 bytes total"));
  }

  #[test]
  fn trunc_respects_char_boundaries() {
    // 'é' is two bytes; cutting at byte 1 must not split it
    let out = trunc_for_log("née", 3);
    assert!(out.starts_with("né"));
  }
}
