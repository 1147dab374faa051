//! Reading layout-relative resources from an ordered repository list

use super::client::HttpClient;
use crate::error::RepositoryError;
use crate::resolver::Repository;
use tracing::debug;

/// A resource together with the repository that served it
#[derive(Debug, Clone)]
pub struct Retrieved {
    pub bytes: Vec<u8>,
    pub repository_id: String,
}

/// Fetches resources from `http(s)://` and `file://` repositories
#[derive(Clone)]
pub struct RepositoryTransport {
    client: HttpClient,
}

impl RepositoryTransport {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Fetch `relative_path` from a single repository
    pub async fn get_from(
        &self,
        repository: &Repository,
        relative_path: &str,
    ) -> Result<Vec<u8>, RepositoryError> {
        match repository.file_root() {
            Some(root) => {
                let path = root.join(relative_path);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => Ok(bytes),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                        RepositoryError::not_found(relative_path, repository.id.as_str()),
                    ),
                    Err(e) => Err(RepositoryError::ReadError {
                        resource: relative_path.to_string(),
                        repository: repository.id.clone(),
                        source: e,
                    }),
                }
            }
            None => {
                self.client
                    .get_bytes(
                        &repository.resource_url(relative_path),
                        relative_path,
                        &repository.id,
                    )
                    .await
            }
        }
    }

    /// Try each repository in order
    ///
    /// If every repository reports the resource missing, the result is
    /// `NotFound`; otherwise the last non-404 failure is returned.
    pub async fn get(
        &self,
        repositories: &[Repository],
        relative_path: &str,
    ) -> Result<Retrieved, RepositoryError> {
        let mut last_failure = None;

        for repository in repositories {
            match self.get_from(repository, relative_path).await {
                Ok(bytes) => {
                    debug!(resource = relative_path, repository = %repository.id, "Fetched resource");
                    return Ok(Retrieved {
                        bytes,
                        repository_id: repository.id.clone(),
                    });
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    debug!(resource = relative_path, repository = %repository.id, error = %e, "Repository failed");
                    last_failure = Some(e);
                }
            }
        }

        Err(last_failure.unwrap_or_else(|| {
            let ids: Vec<&str> = repositories.iter().map(|r| r.id.as_str()).collect();
            RepositoryError::not_found(relative_path, ids.join(", "))
        }))
    }
}
