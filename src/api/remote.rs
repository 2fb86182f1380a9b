//! Purpose: HTTP implementation of `Gateway` (GraphQL JSON + multipart image upload).
//! Exports: `RemoteGateway`.
//! Role: Blocking `ureq` agent driven from the tokio blocking pool.
//! Invariants: Every request carries `Authorization: Bearer <token>` from the call's credential.
//! Invariants: GraphQL envelopes are decoded regardless of HTTP status; an error list wins.
//! Invariants: A rejected image upload yields no path rather than an error.
#![allow(clippy::result_large_err)]

use super::config::{Credential, GatewayConfig};
use super::gateway::{Gateway, GatewayError, GatewayResult, PostInput, PostsPage, RemoteError};
use crate::core::error::{Error, ErrorKind};
use crate::core::post::{ImageUpload, Post, PostId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;

const STATUS_QUERY: &str = r#"
  {
    user {
      status
    }
  }
"#;

const POSTS_QUERY: &str = r#"
  query FetchPosts($page: Int) {
    posts(page: $page) {
      posts {
        _id
        title
        content
        imageUrl
        creator { name }
        createdAt
      }
      totalPosts
    }
  }
"#;

const UPDATE_STATUS_MUTATION: &str = r#"
  mutation UpdateUserStatus($status: String!) {
    updateStatus(status: $status) {
      status
    }
  }
"#;

const CREATE_POST_MUTATION: &str = r#"
  mutation CreateNewPost($title: String!, $content: String!, $imageUrl: String!) {
    createPost(postInput: {title: $title, content: $content, imageUrl: $imageUrl}) {
      _id
      title
      content
      imageUrl
      creator { name }
      createdAt
    }
  }
"#;

const UPDATE_POST_MUTATION: &str = r#"
  mutation UpdatePost($postId: ID!, $title: String!, $content: String!, $imageUrl: String!) {
    updatePost(id: $postId, postInput: {title: $title, content: $content, imageUrl: $imageUrl}) {
      _id
      title
      content
      imageUrl
      creator { name }
      createdAt
    }
  }
"#;

const DELETE_POST_MUTATION: &str = r#"
  mutation DeletePost($postId: ID!) {
    deletePost(id: $postId)
  }
"#;

#[derive(Clone)]
pub struct RemoteGateway {
    inner: Arc<RemoteGatewayInner>,
}

struct RemoteGatewayInner {
    graphql_url: Url,
    image_url: Url,
    agent: ureq::Agent,
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphqlEnvelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<RemoteError>>,
}

#[derive(Deserialize)]
struct UserData {
    user: StatusPayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStatusData {
    update_status: StatusPayload,
}

#[derive(Deserialize)]
struct StatusPayload {
    status: Option<String>,
}

#[derive(Deserialize)]
struct PostsData {
    posts: PostsConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostsConnection {
    posts: Vec<WirePost>,
    total_posts: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostData {
    create_post: WirePost,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePostData {
    update_post: WirePost,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletePostData {
    #[allow(dead_code)]
    delete_post: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePost {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    content: String,
    image_url: Option<String>,
    creator: WireCreator,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

#[derive(Deserialize)]
struct WireCreator {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_path: Option<String>,
}

impl RemoteGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, Error> {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout()).build();
        Ok(Self {
            inner: Arc::new(RemoteGatewayInner {
                graphql_url: config.graphql_url()?,
                image_url: config.image_url()?,
                agent,
            }),
        })
    }

    pub fn graphql_url(&self) -> &Url {
        &self.inner.graphql_url
    }

    async fn run<T, F>(&self, call: F) -> GatewayResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&RemoteGatewayInner) -> GatewayResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || call(&inner))
            .await
            .map_err(|err| {
                GatewayError::Transport(
                    Error::new(ErrorKind::Internal)
                        .with_message("gateway task failed")
                        .with_source(err),
                )
            })?
    }
}

impl Gateway for RemoteGateway {
    async fn fetch_status(&self, credential: &Credential) -> GatewayResult<String> {
        let authorization = credential.authorization();
        self.run(move |inner| {
            let data: UserData = inner.graphql(&authorization, STATUS_QUERY, json!({}))?;
            Ok(data.user.status.unwrap_or_default())
        })
        .await
    }

    async fn fetch_posts(&self, credential: &Credential, page: i64) -> GatewayResult<PostsPage> {
        let authorization = credential.authorization();
        self.run(move |inner| {
            let data: PostsData =
                inner.graphql(&authorization, POSTS_QUERY, json!({ "page": page }))?;
            Ok(PostsPage {
                posts: data.posts.posts.into_iter().map(post_from_wire).collect(),
                total: data.posts.total_posts,
            })
        })
        .await
    }

    async fn update_status(&self, credential: &Credential, status: &str) -> GatewayResult<String> {
        let authorization = credential.authorization();
        let variables = json!({ "status": status });
        self.run(move |inner| {
            let data: UpdateStatusData =
                inner.graphql(&authorization, UPDATE_STATUS_MUTATION, variables)?;
            Ok(data.update_status.status.unwrap_or_default())
        })
        .await
    }

    async fn upload_image(
        &self,
        credential: &Credential,
        image: Option<&ImageUpload>,
        old_path: Option<&str>,
    ) -> GatewayResult<Option<String>> {
        let authorization = credential.authorization();
        let image = image.cloned();
        let old_path = old_path.map(str::to_string);
        self.run(move |inner| inner.upload(&authorization, image.as_ref(), old_path.as_deref()))
            .await
    }

    async fn create_post(&self, credential: &Credential, input: &PostInput) -> GatewayResult<Post> {
        let authorization = credential.authorization();
        let variables = json!({
            "title": input.title,
            "content": input.content,
            "imageUrl": input.image_path,
        });
        self.run(move |inner| {
            let data: CreatePostData =
                inner.graphql(&authorization, CREATE_POST_MUTATION, variables)?;
            Ok(post_from_wire(data.create_post))
        })
        .await
    }

    async fn update_post(
        &self,
        credential: &Credential,
        id: &PostId,
        input: &PostInput,
    ) -> GatewayResult<Post> {
        let authorization = credential.authorization();
        let variables = json!({
            "postId": id.as_str(),
            "title": input.title,
            "content": input.content,
            "imageUrl": input.image_path,
        });
        self.run(move |inner| {
            let data: UpdatePostData =
                inner.graphql(&authorization, UPDATE_POST_MUTATION, variables)?;
            Ok(post_from_wire(data.update_post))
        })
        .await
    }

    async fn delete_post(&self, credential: &Credential, id: &PostId) -> GatewayResult<()> {
        let authorization = credential.authorization();
        let variables = json!({ "postId": id.as_str() });
        self.run(move |inner| {
            let _data: DeletePostData =
                inner.graphql(&authorization, DELETE_POST_MUTATION, variables)?;
            Ok(())
        })
        .await
    }
}

impl RemoteGatewayInner {
    fn graphql<R>(&self, authorization: &str, query: &str, variables: Value) -> GatewayResult<R>
    where
        R: DeserializeOwned,
    {
        let payload = serde_json::to_string(&GraphqlRequest { query, variables }).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode request json")
                .with_source(err)
        })?;
        debug!(url = %self.graphql_url, "graphql request");
        let response = self
            .agent
            .post(self.graphql_url.as_str())
            .set("Authorization", authorization)
            .set("Accept", "application/json")
            .set("Content-Type", "application/json")
            .send_string(&payload);

        let (status, body) = match response {
            Ok(resp) => (resp.status(), read_body(resp)?),
            Err(ureq::Error::Status(code, resp)) => (code, resp.into_string().unwrap_or_default()),
            Err(ureq::Error::Transport(err)) => {
                return Err(Error::new(ErrorKind::Io)
                    .with_message("request failed")
                    .with_source(err)
                    .into());
            }
        };
        decode_graphql(status, &body)
    }

    fn upload(
        &self,
        authorization: &str,
        image: Option<&ImageUpload>,
        old_path: Option<&str>,
    ) -> GatewayResult<Option<String>> {
        let boundary = multipart_boundary()?;
        let body = encode_multipart(&boundary, image, old_path);
        debug!(url = %self.image_url, bytes = body.len(), "image upload");
        let response = self
            .agent
            .put(self.image_url.as_str())
            .set("Authorization", authorization)
            .set("Accept", "application/json")
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .send_bytes(&body);

        match response {
            Ok(resp) => {
                let body = read_body(resp)?;
                let upload: UploadResponse = serde_json::from_str(&body).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("invalid upload response json")
                        .with_source(err)
                })?;
                Ok(upload.file_path.filter(|path| !path.is_empty()))
            }
            Err(ureq::Error::Status(code, _resp)) => {
                warn!(status = code, "image upload rejected; continuing without a path");
                Ok(None)
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("image upload failed")
                .with_source(err)
                .into()),
        }
    }
}

fn read_body(response: ureq::Response) -> Result<String, Error> {
    response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })
}

fn decode_graphql<R>(status: u16, body: &str) -> GatewayResult<R>
where
    R: DeserializeOwned,
{
    let envelope: GraphqlEnvelope<R> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(err) if status >= 400 => {
            return Err(Error::new(error_kind_from_status(status))
                .with_message(format!("remote error status {status}"))
                .with_status(status)
                .with_source(err)
                .into());
        }
        Err(err) => {
            return Err(Error::new(ErrorKind::Internal)
                .with_message("invalid response json")
                .with_source(err)
                .into());
        }
    };
    if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
        return Err(GatewayError::structured(errors));
    }
    if status >= 400 {
        return Err(Error::new(error_kind_from_status(status))
            .with_message(format!("remote error status {status}"))
            .with_status(status)
            .into());
    }
    envelope.data.ok_or_else(|| {
        Error::new(ErrorKind::Internal)
            .with_message("response carried neither data nor errors")
            .into()
    })
}

/// Kind for an error status without an error list. `Validation` and `Remote` stay reserved
/// for structured errors.
fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::Permission,
        _ => ErrorKind::Io,
    }
}

fn post_from_wire(post: WirePost) -> Post {
    Post {
        id: PostId::new(post.id),
        title: post.title,
        content: post.content,
        image_path: post.image_url,
        creator: post.creator.name,
        created_at: post.created_at,
    }
}

fn multipart_boundary() -> Result<String, Error> {
    let mut bytes = [0u8; 16];
    getrandom::fill(&mut bytes).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message(format!("failed to generate multipart boundary: {err}"))
    })?;
    let suffix: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    Ok(format!("postfeed-{suffix}"))
}

fn encode_multipart(
    boundary: &str,
    image: Option<&ImageUpload>,
    old_path: Option<&str>,
) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(image) = image {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                header_safe(&image.file_name),
                header_safe(&image.content_type),
            )
            .as_bytes(),
        );
        body.extend_from_slice(&image.data);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(old_path) = old_path {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"oldPath\"\r\n\r\n{old_path}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn header_safe(value: &str) -> String {
    value
        .chars()
        .filter(|ch| *ch != '\r' && *ch != '\n')
        .map(|ch| if ch == '"' { '\'' } else { ch })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{PostsData, UserData, decode_graphql, encode_multipart, multipart_boundary};
    use crate::api::gateway::GatewayError;
    use crate::core::error::ErrorKind;
    use crate::core::post::ImageUpload;

    #[test]
    fn decodes_posts_page() {
        let body = r#"{"data":{"posts":{"posts":[{"_id":"p1","title":"T","content":"C","imageUrl":"images/a.png","creator":{"name":"Max"},"createdAt":"2026-02-01T10:30:00.000Z"}],"totalPosts":3}}}"#;
        let data: PostsData = decode_graphql(200, body)
            .map_err(|err| err.to_string())
            .expect("data");
        assert_eq!(data.posts.total_posts, 3);
        assert_eq!(data.posts.posts[0].id, "p1");
        assert_eq!(data.posts.posts[0].creator.name, "Max");
    }

    #[test]
    fn error_list_wins_over_http_status() {
        let body = r#"{"errors":[{"message":"Invalid input.","status":422,"data":[{"message":"Title is too short"}]}],"data":null}"#;
        let err = decode_graphql::<UserData>(500, body).err().expect("err");
        assert!(err.is_validation());
        match err {
            GatewayError::Structured(errors) => assert_eq!(errors[0].message, "Invalid input."),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn unparseable_error_status_maps_to_kind() {
        let err = decode_graphql::<UserData>(401, "Unauthorized").err().expect("err");
        match err {
            GatewayError::Transport(err) => {
                assert_eq!(err.kind(), ErrorKind::Permission);
                assert_eq!(err.status(), Some(401));
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn unparseable_422_is_not_a_validation_error() {
        let err = decode_graphql::<UserData>(422, "Unprocessable").err().expect("err");
        assert!(!err.is_validation());
        let err = err.into_error("Post creation failed!");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.message(), Some("Post creation failed!"));
    }

    #[test]
    fn html_gateway_error_page_is_io() {
        let body = "<html><body><h1>502 Bad Gateway</h1></body></html>";
        let err = decode_graphql::<UserData>(502, body).err().expect("err");
        match err {
            GatewayError::Transport(err) => {
                assert_eq!(err.kind(), ErrorKind::Io);
                assert_eq!(err.status(), Some(502));
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn error_status_with_empty_envelope_is_io() {
        let err = decode_graphql::<UserData>(500, r#"{"data":null}"#).err().expect("err");
        match err {
            GatewayError::Transport(err) => assert_eq!(err.kind(), ErrorKind::Io),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn missing_data_is_internal() {
        let err = decode_graphql::<UserData>(200, r#"{"data":null}"#).err().expect("err");
        match err {
            GatewayError::Transport(err) => assert_eq!(err.kind(), ErrorKind::Internal),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn multipart_contains_image_and_old_path() {
        let image = ImageUpload::new("cat \"1\".png", "image/png", b"PNGDATA".to_vec());
        let body = encode_multipart("b0", Some(&image), Some("images/old.png"));
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with("--b0\r\n"));
        assert!(text.contains("name=\"image\"; filename=\"cat '1'.png\""));
        assert!(text.contains("Content-Type: image/png\r\n\r\nPNGDATA\r\n"));
        assert!(text.contains("name=\"oldPath\"\r\n\r\nimages/old.png\r\n"));
        assert!(text.ends_with("--b0--\r\n"));
    }

    #[test]
    fn multipart_without_parts_is_just_terminator() {
        let body = encode_multipart("b1", None, None);
        assert_eq!(body, b"--b1--\r\n");
    }

    #[test]
    fn boundaries_are_unique() {
        let first = multipart_boundary().expect("boundary");
        let second = multipart_boundary().expect("boundary");
        assert_ne!(first, second);
        assert!(first.starts_with("postfeed-"));
    }
}
