//! Markdown document layout for one issue thread

use crate::config::RenderConfig;
use crate::constants::{FRONT_MATTER_DELIMITER, HEADING_MARKER};
use crate::datetime::{self, Timestamp};
use crate::record::{Author, CommentRecord, IssueRecord, Record, Value};
use crate::template::resolve_value;

/// Render an issue and its comments into the document text.
///
/// Layout: optional front matter, title heading, opening post sub-heading,
/// issue body, then one sub-heading + body block per comment. Persisting the
/// text is the caller's job.
pub fn render(issue: &IssueRecord, comments: &[CommentRecord], config: &RenderConfig) -> String {
    let issue_value = issue.to_value();

    let opening = sub_heading(
        &issue_value,
        &issue.author,
        issue.updated_at,
        issue.created_at,
        1,
        config,
    );

    let comments_block = comments
        .iter()
        .map(|comment| render_comment(comment, config))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{}\n{} [#{}]({}) - {}\n\n{}\n\n{}\n\n{}\n",
        front_matter(&issue_value, config),
        config.heading(),
        issue.number,
        issue.url,
        issue.title,
        opening,
        issue.body.as_deref().unwrap_or_default(),
        comments_block,
    )
}

/// `---` delimited `key: "value"` block, empty when nothing is configured
fn front_matter(issue: &Value, config: &RenderConfig) -> String {
    if config.front_matter.is_empty() {
        return String::new();
    }

    let lines = config
        .front_matter
        .iter()
        .map(|(key, template)| format!("{}: \"{}\"", key, resolve_value(template, issue, config)))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{delim}\n{lines}\n{delim}\n\n", delim = FRONT_MATTER_DELIMITER, lines = lines)
}

fn render_comment(comment: &CommentRecord, config: &RenderConfig) -> String {
    let title = sub_heading(
        &comment.to_value(),
        &comment.author,
        comment.updated_at,
        comment.created_at,
        2,
        config,
    );
    format!("{}\n\n{}", title, comment.body.as_deref().unwrap_or_default())
}

/// Author line; `depth` extra heading markers below the document title
fn sub_heading(
    value: &Value,
    author: &Author,
    updated_at: Option<Timestamp>,
    created_at: Timestamp,
    depth: usize,
    config: &RenderConfig,
) -> String {
    if let Some(template) = &config.comment_title_template {
        return resolve_value(template, value, config);
    }

    let when = updated_at.filter(Timestamp::is_valid).unwrap_or(created_at);

    format!(
        "{}{} [{}]({}) commented on {}",
        config.heading(),
        HEADING_MARKER.repeat(depth),
        author.login,
        author.profile_url,
        datetime::format(&when, Some(&config.date_format)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issue() -> IssueRecord {
        serde_json::from_value(json!({
            "number": 42,
            "title": "Bug",
            "html_url": "https://x/42",
            "body": "desc",
            "user": { "login": "ann", "html_url": "https://x/ann" },
            "state": "open",
            "created_at": "2023-12-30T08:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "comments": 0,
            "comments_url": "https://x/42/comments"
        }))
        .unwrap()
    }

    fn comment(login: &str, body: &str, created: &str, updated: Option<&str>) -> CommentRecord {
        serde_json::from_value(json!({
            "user": { "login": login, "html_url": format!("https://x/{}", login) },
            "body": body,
            "created_at": created,
            "updated_at": updated
        }))
        .unwrap()
    }

    #[test]
    fn default_layout() {
        let doc = render(&issue(), &[], &RenderConfig::default());
        let lines: Vec<&str> = doc.lines().collect();

        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "# [#42](https://x/42) - Bug");
        assert_eq!(lines[3], "## [ann](https://x/ann) commented on Jan 02, 2024");
        assert_eq!(lines[5], "desc");
        assert_eq!(
            doc,
            "\n# [#42](https://x/42) - Bug\n\n## [ann](https://x/ann) commented on Jan 02, 2024\n\ndesc\n\n\n"
        );
    }

    #[test]
    fn comments_are_one_level_deeper_and_ordered() {
        let comments = vec![
            comment("bob", "first", "2024-01-03T00:00:00Z", None),
            comment("cy", "second", "2024-01-04T00:00:00Z", Some("2024-01-05T00:00:00Z")),
        ];
        let config = RenderConfig {
            heading_level: 2,
            ..RenderConfig::default()
        };
        let doc = render(&issue(), &comments, &config);

        assert!(doc.contains("## [#42](https://x/42) - Bug\n"));
        assert!(doc.contains("### [ann](https://x/ann) commented on Jan 02, 2024"));
        assert!(doc.ends_with(
            "desc\n\n#### [bob](https://x/bob) commented on Jan 03, 2024\n\nfirst\n\n\
             #### [cy](https://x/cy) commented on Jan 05, 2024\n\nsecond\n"
        ));
    }

    #[test]
    fn front_matter_is_resolved_in_order() {
        let config = RenderConfig {
            front_matter: vec![
                ("title".to_string(), "{title}".to_string()),
                ("date".to_string(), "{created_at|yyyy-MM-dd}".to_string()),
                ("milestone".to_string(), "{milestone.title??state}".to_string()),
            ],
            ..RenderConfig::default()
        };
        let doc = render(&issue(), &[], &config);

        assert!(doc.starts_with(
            "---\ntitle: \"Bug\"\ndate: \"2023-12-30\"\nmilestone: \"open\"\n---\n\n\n# [#42]"
        ));
    }

    #[test]
    fn comment_title_template_replaces_default_heading() {
        let config = RenderConfig {
            comment_title_template: Some(
                "**{user.login}** wrote on {created_at|dd.MM.yyyy}".to_string(),
            ),
            ..RenderConfig::default()
        };
        let comments = vec![comment("bob", "hi", "2024-01-03T00:00:00Z", None)];
        let doc = render(&issue(), &comments, &config);

        assert!(doc.contains("\n**ann** wrote on 30.12.2023\n"));
        assert!(doc.contains("\n**bob** wrote on 03.01.2024\n\nhi\n"));
    }

    #[test]
    fn missing_body_renders_empty() {
        let mut issue = issue();
        issue.body = None;
        let doc = render(&issue, &[], &RenderConfig::default());
        assert!(doc.ends_with("Jan 02, 2024\n\n\n\n\n"));
    }

    #[test]
    fn comment_without_body_renders_empty() {
        let mut bare = comment("bob", "", "2024-01-03T00:00:00Z", None);
        bare.body = None;
        let doc = render(&issue(), &[bare], &RenderConfig::default());
        assert!(doc.ends_with("\n### [bob](https://x/bob) commented on Jan 03, 2024\n\n\n"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let comments = vec![comment("bob", "first", "2024-01-03T00:00:00Z", None)];
        let config = RenderConfig::default();
        assert_eq!(
            render(&issue(), &comments, &config),
            render(&issue(), &comments, &config)
        );
    }
}
