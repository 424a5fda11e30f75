use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{TranscriptError, TranscriptProvider, TranscriptSegment};
use crate::ProviderError;

const CAPTION_TRACKS_MARKER: &str = "\"captionTracks\":";

/// Caption track entry embedded in the watch page player response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrackEntry {
    base_url: String,
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrackEntry {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
struct Json3Transcript {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: Option<f64>,
    #[serde(default)]
    d_duration_ms: Option<f64>,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Transcript provider reading YouTube's published caption tracks
pub struct YoutubeTranscriptClient {
    client: Client,
    base_url: String,
}

impl YoutubeTranscriptClient {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_url("https://www.youtube.com", timeout)
    }

    /// Point the client at another host (used by tests)
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_caption_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrackEntry>, TranscriptError> {
        let response = self
            .client
            .get(format!("{}/watch", self.base_url))
            .query(&[("v", video_id)])
            .send()
            .await
            .map_err(ProviderError::from)?;

        if !response.status().is_success() {
            return Err(ProviderError::Network(format!("watch page returned HTTP {}", response.status())).into());
        }

        let page = response.text().await.map_err(ProviderError::from)?;
        parse_caption_tracks(&page)
    }

    async fn fetch_track(&self, track: &CaptionTrackEntry) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        tracing::debug!("Fetching {} transcript track", track.language_code);

        let response = self
            .client
            .get(&track.base_url)
            .query(&[("fmt", "json3")])
            .send()
            .await
            .map_err(ProviderError::from)?;

        if !response.status().is_success() {
            return Err(ProviderError::Network(format!("transcript track returned HTTP {}", response.status())).into());
        }

        let body: Json3Transcript = response.json().await.map_err(ProviderError::from)?;

        Ok(body
            .events
            .into_iter()
            .filter_map(|event| {
                let text: String = event.segs.iter().map(|seg| seg.utf8.as_str()).collect();
                let text = text.replace('\n', " ").trim().to_string();
                (!text.is_empty()).then(|| TranscriptSegment {
                    text,
                    start: event.t_start_ms.unwrap_or(0.0) / 1000.0,
                    duration: event.d_duration_ms.unwrap_or(0.0) / 1000.0,
                })
            })
            .collect())
    }
}

/// Pull the caption track list out of the watch page. No list means transcripts are disabled.
fn parse_caption_tracks(page: &str) -> Result<Vec<CaptionTrackEntry>, TranscriptError> {
    let Some(start) = page.find(CAPTION_TRACKS_MARKER) else {
        return Err(TranscriptError::Disabled);
    };

    let rest = &page[start + CAPTION_TRACKS_MARKER.len()..];
    let mut deserializer = serde_json::Deserializer::from_str(rest);
    let tracks = Vec::<CaptionTrackEntry>::deserialize(&mut deserializer)
        .map_err(|e| ProviderError::InvalidResponse(format!("caption track list: {}", e)))?;

    if tracks.is_empty() {
        return Err(TranscriptError::Disabled);
    }

    Ok(tracks)
}

/// For each preferred language in order, a human track beats a generated one
fn select_track<'a>(tracks: &'a [CaptionTrackEntry], languages: &[String]) -> Option<&'a CaptionTrackEntry> {
    languages.iter().find_map(|lang| {
        tracks
            .iter()
            .find(|t| &t.language_code == lang && !t.is_generated())
            .or_else(|| tracks.iter().find(|t| &t.language_code == lang))
    })
}

#[async_trait]
impl TranscriptProvider for YoutubeTranscriptClient {
    async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let tracks = self.fetch_caption_tracks(video_id).await?;

        let track = select_track(&tracks, languages)
            .ok_or_else(|| TranscriptError::NotFound(languages.to_vec()))?;

        self.fetch_track(track).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn languages() -> Vec<String> {
        vec!["en".to_string(), "hi".to_string()]
    }

    #[test]
    fn test_page_without_tracks_is_disabled() {
        let err = parse_caption_tracks("<html>{\"playabilityStatus\":{}}</html>").unwrap_err();
        assert_eq!(err, TranscriptError::Disabled);
    }

    #[test]
    fn test_select_track_prefers_human_then_language_order() {
        let page = r#"x"captionTracks":[
            {"baseUrl":"https://t/hi","languageCode":"hi"},
            {"baseUrl":"https://t/en-asr","languageCode":"en","kind":"asr"},
            {"baseUrl":"https://t/en","languageCode":"en"}
        ],"audioTracks":[]"#;
        let tracks = parse_caption_tracks(page).unwrap();
        assert_eq!(tracks.len(), 3);

        let chosen = select_track(&tracks, &languages()).unwrap();
        assert_eq!(chosen.base_url, "https://t/en");

        let hindi_first = vec!["hi".to_string(), "en".to_string()];
        assert_eq!(select_track(&tracks, &hindi_first).unwrap().base_url, "https://t/hi");

        assert!(select_track(&tracks, &["fr".to_string()]).is_none());
    }

    #[tokio::test]
    async fn test_fetch_transcript_from_watch_page() {
        let server = MockServer::start().await;
        let page = format!(
            r#"<script>var ytInitialPlayerResponse = {{"captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"{}/api/timedtext?v=abc123&lang=en","languageCode":"en","kind":"asr"}}]}}}}}};</script>"#,
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("v", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .and(query_param("fmt", "json3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"events":[
                    {"tStartMs":0,"dDurationMs":1500,"segs":[{"utf8":"Hello"},{"utf8":" world"}]},
                    {"tStartMs":1500,"segs":[{"utf8":"\n"}]},
                    {"tStartMs":2000,"dDurationMs":1000,"segs":[{"utf8":"again"}]}
                ]}"#,
            ))
            .mount(&server)
            .await;

        let client = YoutubeTranscriptClient::with_base_url(server.uri(), Duration::from_secs(5)).unwrap();
        let segments = client.fetch_transcript("abc123", &languages()).await.unwrap();

        let texts: Vec<_> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello world", "again"]);
        assert_eq!(segments[1].start, 2.0);
    }

    #[tokio::test]
    async fn test_missing_language_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#""captionTracks":[{"baseUrl":"https://t/de","languageCode":"de"}]"#,
            ))
            .mount(&server)
            .await;

        let client = YoutubeTranscriptClient::with_base_url(server.uri(), Duration::from_secs(5)).unwrap();
        let err = client.fetch_transcript("abc123", &languages()).await.unwrap_err();
        assert_eq!(err, TranscriptError::NotFound(languages()));
    }
}
