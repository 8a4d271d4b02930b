use anyhow::{bail, Context, Result};

use crate::comments::CommentFeed;
use crate::config;
use crate::store::rest::RestStore;

/// Parse CLI args for `triage comment` and post the comment headlessly.
pub async fn handle_comment(args: &[String]) -> Result<()> {
    let (test_case_id, content, reply_to) = parse_comment_args(args)?;

    let config = config::load_config()?;
    let Some(server) = config.server else {
        bail!("No server configured. Set [server] base_url in ~/.triage/config.toml");
    };

    let store = RestStore::new(server.base_url, server.api_token);
    let mut feed = CommentFeed::new(test_case_id);
    feed.post(&store, &content, reply_to)
        .await
        .with_context(|| format!("Failed to comment on test case {test_case_id}"))?;

    if reply_to.is_some() {
        println!("Reply posted to test case {test_case_id}");
    } else {
        println!("Comment posted to test case {test_case_id}");
    }
    Ok(())
}

/// Parse `triage comment` arguments into (test case id, content, reply-to).
///
/// Supported forms:
///   triage comment 5 "Fails on staging too"
///   triage comment 5 Fails on staging too
///   triage comment 5 "Same here" -r 12
///   triage comment 5 "Same here" --reply-to 12
pub fn parse_comment_args(args: &[String]) -> Result<(i64, String, Option<i64>)> {
    let usage = "Usage: triage comment <test-case-id> <text> [-r <comment-id>]\n\nExamples:\n  triage comment 5 \"Fails on staging too\"\n  triage comment 5 \"Same here\" -r 12";

    let Some(first) = args.first() else {
        bail!("{usage}");
    };
    let test_case_id: i64 = first
        .parse()
        .with_context(|| format!("Expected a numeric test case id, got '{first}'\n\n{usage}"))?;

    let mut content_parts: Vec<String> = Vec::new();
    let mut reply_to: Option<i64> = None;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-r" | "--reply-to" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    bail!("Missing value for -r/--reply-to flag");
                };
                reply_to = Some(
                    value
                        .parse()
                        .with_context(|| format!("Expected a numeric comment id, got '{value}'"))?,
                );
            }
            _ => {
                content_parts.push(args[i].clone());
            }
        }
        i += 1;
    }

    let content = content_parts.join(" ");
    if content.trim().is_empty() {
        bail!("Comment text cannot be empty\n\n{usage}");
    }

    Ok((test_case_id, content, reply_to))
}

pub fn print_help() {
    println!("triage — terminal kanban for QA failure triage\n");
    println!("USAGE:");
    println!("  triage                     Launch the board");
    println!("  triage comment <id> <text> Post a comment on a test case");
    println!();
    println!("COMMENT OPTIONS:");
    println!("  -r, --reply-to <id>  Reply to an existing top-level comment");
    println!();
    println!("EXAMPLES:");
    println!("  triage comment 5 \"Fails on staging too\"");
    println!("  triage comment 5 \"Same here\" -r 12");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_simple_comment() {
        let (id, content, reply) =
            parse_comment_args(&args(&["5", "Fails on staging too"])).unwrap();
        assert_eq!(id, 5);
        assert_eq!(content, "Fails on staging too");
        assert_eq!(reply, None);
    }

    #[test]
    fn parse_unquoted_words_join() {
        let (_, content, _) = parse_comment_args(&args(&["5", "Fails", "on", "staging"])).unwrap();
        assert_eq!(content, "Fails on staging");
    }

    #[test]
    fn parse_reply_flag() {
        let (id, content, reply) =
            parse_comment_args(&args(&["5", "Same here", "-r", "12"])).unwrap();
        assert_eq!(id, 5);
        assert_eq!(content, "Same here");
        assert_eq!(reply, Some(12));

        let (_, _, reply) =
            parse_comment_args(&args(&["5", "--reply-to", "12", "Same here"])).unwrap();
        assert_eq!(reply, Some(12));
    }

    #[test]
    fn rejects_missing_or_bad_args() {
        assert!(parse_comment_args(&args(&[])).is_err());
        assert!(parse_comment_args(&args(&["abc", "text"])).is_err());
        assert!(parse_comment_args(&args(&["5"])).is_err());
        assert!(parse_comment_args(&args(&["5", "   "])).is_err());
        assert!(parse_comment_args(&args(&["5", "text", "-r"])).is_err());
        assert!(parse_comment_args(&args(&["5", "text", "-r", "xyz"])).is_err());
    }
}
