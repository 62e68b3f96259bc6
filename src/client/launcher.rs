//! Meeting launch.
//!
//! Joining opens the provider's meeting link outside the client. Teams links
//! are forced into the browser experience with `web=1`.

use url::Url;

use crate::client::ClientError;
use crate::domain::MeetingProvider;

/// Opens a meeting link (new browser tab, system handler, ...)
#[cfg_attr(test, mockall::automock)]
pub trait MeetingLauncher: Send + Sync {
    fn open(&self, url: &str) -> Result<(), ClientError>;
}

/// Provider-specific launch URL, `None` for a blank link
pub fn meeting_launch_url(url: &str, provider: MeetingProvider) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    match provider {
        MeetingProvider::Teams => Some(match Url::parse(url) {
            Ok(mut parsed) => {
                let pairs: Vec<(String, String)> = parsed
                    .query_pairs()
                    .filter(|(key, _)| key != "web")
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                parsed
                    .query_pairs_mut()
                    .clear()
                    .extend_pairs(pairs)
                    .append_pair("web", "1");
                parsed.to_string()
            }
            Err(_) if url.contains('?') => format!("{url}&web=1"),
            Err(_) => format!("{url}?web=1"),
        }),
        MeetingProvider::Zoom => Some(url.to_string()),
    }
}

/// Launcher that only records the link in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLauncher;

impl MeetingLauncher for LogLauncher {
    fn open(&self, url: &str) -> Result<(), ClientError> {
        tracing::info!(%url, "Meeting link ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(
        "https://teams.microsoft.com/l/meetup-join/abc",
        "https://teams.microsoft.com/l/meetup-join/abc?web=1";
        "adds web flag"
    )]
    #[test_case(
        "https://teams.microsoft.com/l/meetup-join/abc?context=x&web=0",
        "https://teams.microsoft.com/l/meetup-join/abc?context=x&web=1";
        "overrides existing web flag"
    )]
    #[test_case("not a url", "not a url?web=1"; "unparseable link")]
    fn test_teams_links_force_web_client(input: &str, expected: &str) {
        assert_eq!(
            meeting_launch_url(input, MeetingProvider::Teams).as_deref(),
            Some(expected)
        );
    }

    #[test]
    fn test_zoom_links_unchanged() {
        let url = "https://zoom.us/j/123?pwd=abc";
        assert_eq!(
            meeting_launch_url(url, MeetingProvider::Zoom).as_deref(),
            Some(url)
        );
    }

    #[test]
    fn test_blank_link() {
        assert_eq!(meeting_launch_url("  ", MeetingProvider::Teams), None);
    }
}
