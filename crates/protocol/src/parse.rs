//! Turn decoding — classify raw oracle text into exactly one intent.
//!
//! Grammar (informal):
//! ```text
//! turn        = line*
//! invocation  = "FUNCTION_CALL:" name ("|" arg)*
//! final       = "FINAL_ANSWER:" "[" payload "]"
//! name        = [a-z0-9_]+
//! ```
//!
//! Lines are scanned in order; the first line carrying either prefix
//! decides the turn. A directive line with a malformed payload makes the
//! whole turn unparseable — absence of an exact-format match is never
//! turned into a best-guess invocation.

use stepline_core::{Intent, Invocation};

/// Literal prefix of an invocation line.
pub const INVOKE_PREFIX: &str = "FUNCTION_CALL:";

/// Literal prefix of a final-answer line.
pub const FINAL_PREFIX: &str = "FINAL_ANSWER:";

/// Decode one oracle turn. Pure and stateless: the same text always
/// decodes to the same intent.
pub fn decode_turn(raw: &str) -> Intent {
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(INVOKE_PREFIX) {
            return decode_invocation(rest);
        }

        if let Some(rest) = line.strip_prefix(FINAL_PREFIX) {
            return decode_final(rest);
        }

        // Not a directive line — skip. The oracle may prefix its turn with
        // commentary (e.g. a SELF_CHECK line); only directives count.
    }

    Intent::Unparseable
}

fn decode_invocation(rest: &str) -> Intent {
    let mut parts = rest.split('|');
    let name = parts.next().unwrap_or("").trim();

    if name.is_empty() || !is_tool_name(name) {
        return Intent::Unparseable;
    }

    let args: Vec<String> = parts.map(|p| p.trim().to_string()).collect();
    Intent::Invoke(Invocation::new(name, args))
}

fn decode_final(rest: &str) -> Intent {
    let rest = rest.trim();
    if rest.len() < 2 || !rest.starts_with('[') || !rest.ends_with(']') {
        return Intent::Unparseable;
    }
    Intent::Final {
        payload: rest[1..rest.len() - 1].to_string(),
    }
}

fn is_tool_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_invocation_with_single_arg() {
        let intent = decode_turn("FUNCTION_CALL: get_price|GOOG");
        assert_eq!(
            intent,
            Intent::Invoke(Invocation::new("get_price", vec!["GOOG".into()]))
        );
    }

    #[test]
    fn decodes_invocation_with_multiple_args() {
        let intent = decode_turn("FUNCTION_CALL: check_answer|(3 + 5) * 2|16");
        assert_eq!(
            intent,
            Intent::Invoke(Invocation::new(
                "check_answer",
                vec!["(3 + 5) * 2".into(), "16".into()]
            ))
        );
    }

    #[test]
    fn decodes_invocation_with_no_args() {
        let intent = decode_turn("FUNCTION_CALL: get_price");
        assert_eq!(intent, Intent::Invoke(Invocation::new("get_price", vec![])));
    }

    #[test]
    fn decodes_final_answer_verbatim() {
        assert_eq!(
            decode_turn("FINAL_ANSWER: [42]"),
            Intent::Final {
                payload: "42".into()
            }
        );
        assert_eq!(
            decode_turn("FINAL_ANSWER: [The current price of GOOG is $123.45]"),
            Intent::Final {
                payload: "The current price of GOOG is $123.45".into()
            }
        );
    }

    #[test]
    fn commentary_before_directive_is_skipped() {
        let raw = "SELF_CHECK: evaluated expression, got 16.\nFINAL_ANSWER: [16]";
        assert_eq!(
            decode_turn(raw),
            Intent::Final {
                payload: "16".into()
            }
        );
    }

    #[test]
    fn first_directive_line_wins() {
        let raw = "FUNCTION_CALL: get_price|GOOG\nFINAL_ANSWER: [123.45]";
        assert!(matches!(decode_turn(raw), Intent::Invoke(_)));

        let raw = "FINAL_ANSWER: [123.45]\nFUNCTION_CALL: get_price|GOOG";
        assert!(matches!(decode_turn(raw), Intent::Final { .. }));
    }

    #[test]
    fn plain_text_is_unparseable() {
        assert_eq!(decode_turn("The answer is 42."), Intent::Unparseable);
        assert_eq!(decode_turn(""), Intent::Unparseable);
        assert_eq!(decode_turn("\n\n"), Intent::Unparseable);
    }

    #[test]
    fn malformed_final_payload_is_unparseable() {
        assert_eq!(decode_turn("FINAL_ANSWER: 42"), Intent::Unparseable);
        assert_eq!(decode_turn("FINAL_ANSWER: [42"), Intent::Unparseable);
        assert_eq!(decode_turn("FINAL_ANSWER: 42]"), Intent::Unparseable);
        assert_eq!(decode_turn("FINAL_ANSWER:"), Intent::Unparseable);
    }

    #[test]
    fn malformed_tool_name_is_unparseable() {
        assert_eq!(decode_turn("FUNCTION_CALL: |GOOG"), Intent::Unparseable);
        assert_eq!(
            decode_turn("FUNCTION_CALL: Get Price|GOOG"),
            Intent::Unparseable
        );
    }

    #[test]
    fn empty_payload_is_allowed() {
        assert_eq!(
            decode_turn("FINAL_ANSWER: []"),
            Intent::Final {
                payload: String::new()
            }
        );
    }

    #[test]
    fn args_are_trimmed_but_otherwise_verbatim() {
        let intent = decode_turn("FUNCTION_CALL: send_message| Problem: X, Answer: Y ");
        assert_eq!(
            intent,
            Intent::Invoke(Invocation::new(
                "send_message",
                vec!["Problem: X, Answer: Y".into()]
            ))
        );
    }

    #[test]
    fn decoding_is_idempotent() {
        let raw = "FUNCTION_CALL: evaluate_expression|(3/4) + (5/6)";
        assert_eq!(decode_turn(raw), decode_turn(raw));

        let raw = "some unparseable noise";
        assert_eq!(decode_turn(raw), decode_turn(raw));
    }
}
