//! File model: upload, copy and space file listings.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

use crate::entity::{require_id, Entity, Record, SpaceId};
use crate::error::{PodioError, Result};
use crate::pagination::{collect_all, Page, PaginationParams, DEFAULT_LIMIT};
use crate::session::{RequestOptions, Session};
use crate::traits::{Get, List};

const ATTACHED_TO: &[&str] = &["item", "status", "task", "space"];
const FILE_TYPES: &[&str] = &["image", "application", "video", "text", "audio"];
const HOSTED_BY: &[&str] = &[
    "podio",
    "google",
    "boxnet",
    "dropbox",
    "evernote",
    "live",
    "sharefile",
    "sugarsync",
    "yousendit",
];
const SORT_BY: &[&str] = &["name", "created_on"];
const OCTET_STREAM: &str = "application/octet-stream";

/// A file stored in or linked from Podio.
#[derive(Debug, Clone)]
pub struct File {
    session: Session,
    id: u64,
    data: Record,
}

impl Entity for File {
    const KIND: &'static str = "File";

    fn from_record(session: Session, data: Record) -> Result<Self> {
        let id = require_id(&data, Self::KIND, "file_id")?;
        Ok(Self { session, id, data })
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn data(&self) -> &Record {
        &self.data
    }

    fn into_record(self) -> Record {
        self.data
    }
}

/// Content to upload.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Read from disk when uploading.
    Path(PathBuf),
    /// In-memory content.
    Bytes(Vec<u8>),
}

impl From<PathBuf> for FileSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<u8>> for FileSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

#[derive(Deserialize)]
struct FileRef {
    file_id: u64,
}

impl File {
    pub fn file_id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.field_str("name")
    }

    pub fn mimetype(&self) -> Option<&str> {
        self.field_str("mimetype")
    }

    pub fn size(&self) -> Option<u64> {
        self.field_u64("size")
    }

    pub fn link(&self) -> Option<&str> {
        self.field_str("link")
    }

    /// Upload a file.
    ///
    /// The stored name is `file_name` if given, else the path's file name,
    /// else a random UUID.
    ///
    /// # Errors
    ///
    /// Returns [`PodioError::Io`] if a path source cannot be read.
    #[tracing::instrument(skip(session, source))]
    pub async fn upload(
        session: &Session,
        source: impl Into<FileSource>,
        file_name: Option<&str>,
    ) -> Result<Self> {
        let (content, path_name, mime) = match source.into() {
            FileSource::Path(path) => {
                let content = tokio::fs::read(&path).await?;
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string);
                let mime = mime_guess::from_path(&path)
                    .first_or_octet_stream()
                    .to_string();
                (content, name, mime)
            }
            FileSource::Bytes(content) => (content, None, OCTET_STREAM.to_string()),
        };

        let name = file_name
            .map(str::to_string)
            .or(path_name)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        tracing::debug!(%name, bytes = content.len(), "uploading file");

        let part = Part::bytes(content)
            .file_name(name.clone())
            .mime_str(&mime)?;
        let form = Form::new().text("filename", name).part("source", part);

        let response = session
            .call("/file", Method::POST, RequestOptions::new().multipart(form))
            .await?;
        let value: Value = Session::read_json(response).await?;
        Self::from_value(session, value)
    }

    /// Copy a file and fetch the copy.
    #[tracing::instrument(skip(session))]
    pub async fn copy_file(session: &Session, file_id: u64) -> Result<Self> {
        let response = session.post_empty(&format!("/file/{file_id}/copy")).await?;
        let copied: FileRef = Session::read_json(response).await?;
        Self::get(session, copied.file_id).await
    }

    /// Copy this file.
    pub async fn copy(&self) -> Result<Self> {
        Self::copy_file(&self.session, self.id).await
    }

    /// List one page of files in a space.
    ///
    /// # Errors
    ///
    /// Returns [`PodioError::Validation`] for disallowed filter values,
    /// without contacting the API.
    #[tracing::instrument(skip(session, space))]
    pub async fn list_space_files(
        session: &Session,
        space: impl Into<SpaceId>,
        query: &FileListQuery,
    ) -> Result<Vec<Self>> {
        query.validate()?;
        let space_id = space.into();
        let response = session
            .get_with_query(&format!("/file/space/{space_id}"), query.clone())
            .await?;
        let value: Value = Session::read_json(response).await?;
        Self::from_values(session, value)
    }

    /// List one page of files in a space, with pagination info.
    pub async fn list_space_files_page(
        session: &Session,
        space: impl Into<SpaceId>,
        query: &FileListQuery,
    ) -> Result<Page<Self>> {
        let items = Self::list_space_files(session, space, query).await?;
        Ok(Page::new(items, query.pagination(), None))
    }

    /// List every file in a space, starting at the query's offset.
    pub async fn list_all_space_files(
        session: &Session,
        space: impl Into<SpaceId>,
        query: &FileListQuery,
    ) -> Result<Vec<Self>> {
        query.validate()?;
        let space_id = space.into();
        collect_all(query.pagination(), |params| {
            let query = query.clone().page(params);
            async move { Self::list_space_files_page(session, space_id, &query).await }
        })
        .await
    }
}

#[async_trait]
impl Get for File {
    type Id = u64;

    #[tracing::instrument(skip(session))]
    async fn get(session: &Session, file_id: u64) -> Result<Self> {
        let value: Value = session.get_json(&format!("/file/{file_id}")).await?;
        Self::from_value(session, value)
    }
}

#[async_trait]
impl List for File {
    type Parent = SpaceId;
    type Query = FileListQuery;

    async fn list(session: &Session, space: SpaceId, query: &FileListQuery) -> Result<Vec<Self>> {
        Self::list_space_files(session, space, query).await
    }
}

/// Filters for listing the files of a space.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileListQuery {
    /// One of `item`, `status`, `task`, `space`.
    pub attached_to: Option<String>,
    /// One of `image`, `application`, `video`, `text`, `audio`.
    #[serde(rename = "filetype")]
    pub file_type: Option<String>,
    pub hosted_by: Option<String>,
    /// `name` or `created_on`.
    pub sort_by: String,
    pub sort_desc: bool,
    pub limit: u32,
    pub offset: u32,
}

impl Default for FileListQuery {
    fn default() -> Self {
        Self {
            attached_to: None,
            file_type: None,
            hosted_by: None,
            sort_by: "name".to_string(),
            sort_desc: true,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl FileListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn attached_to(mut self, value: impl Into<String>) -> Self {
        self.attached_to = Some(value.into());
        self
    }

    #[must_use]
    pub fn file_type(mut self, value: impl Into<String>) -> Self {
        self.file_type = Some(value.into());
        self
    }

    #[must_use]
    pub fn hosted_by(mut self, value: impl Into<String>) -> Self {
        self.hosted_by = Some(value.into());
        self
    }

    #[must_use]
    pub fn sort_by(mut self, key: impl Into<String>, descending: bool) -> Self {
        self.sort_by = key.into();
        self.sort_desc = descending;
        self
    }

    #[must_use]
    pub fn page(mut self, params: PaginationParams) -> Self {
        self.limit = params.limit;
        self.offset = params.offset;
        self
    }

    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.limit, self.offset)
    }

    /// Check every enumerated filter, reporting all violations at once.
    ///
    /// # Errors
    ///
    /// Returns [`PodioError::Validation`] listing the allowed values of
    /// each offending filter.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("attached_to", self.attached_to.as_deref(), ATTACHED_TO),
            ("file_type", self.file_type.as_deref(), FILE_TYPES),
            ("hosted_by", self.hosted_by.as_deref(), HOSTED_BY),
            ("sort_by", Some(self.sort_by.as_str()), SORT_BY),
        ];

        let errors: Vec<String> = checks
            .iter()
            .filter_map(|(name, value, allowed)| match value {
                Some(v) if !allowed.contains(v) => Some(format!(
                    "\"{name}\" should be one of: {}",
                    allowed.join(", ")
                )),
                _ => None,
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PodioError::Validation(errors.join("\n")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_string() {
        let qs = serde_qs::to_string(&FileListQuery::default()).unwrap();
        assert_eq!(qs, "sort_by=name&sort_desc=true&limit=20&offset=0");
    }

    #[test]
    fn test_file_type_is_sent_as_filetype() {
        let query = FileListQuery::new()
            .attached_to("item")
            .file_type("image")
            .page(PaginationParams::new(50, 100));
        let qs = serde_qs::to_string(&query).unwrap();
        assert_eq!(
            qs,
            "attached_to=item&filetype=image&sort_by=name&sort_desc=true&limit=50&offset=100"
        );
    }

    #[test]
    fn test_every_violation_is_reported() {
        let query = FileListQuery::new()
            .attached_to("comment")
            .file_type("binary")
            .hosted_by("podio")
            .sort_by("size", false);
        let msg = query.validate().unwrap_err().to_string();

        assert!(msg.contains("\"attached_to\" should be one of: item, status, task, space"));
        assert!(msg.contains("\"file_type\" should be one of: image, application, video, text, audio"));
        assert!(msg.contains("\"sort_by\" should be one of: name, created_on"));
        assert!(!msg.contains("hosted_by"));
    }

    #[test]
    fn test_valid_query() {
        let query = FileListQuery::new().hosted_by("dropbox").sort_by("created_on", false);
        assert!(query.validate().is_ok());
    }
}
