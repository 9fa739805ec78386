//! File operations.

use liaison_core::ClassifiedError;
use liaison_middleware::stages::{ValidationRule, ValidationSchema};
use serde_json::json;

use super::Access;
use crate::controller::Controller;
use crate::model::{
    FileDownload, FileInfo, FileRef, FileSearch, FileStats, FileTagsUpdate, FileUpload, UserRef,
};
use crate::pipeline::ControllerCore;
use crate::services::{FileServices, Services};
use crate::settings::ControllerSettings;
use crate::usecase::{ActivityEntry, PermissionRequest};

/// Controller name.
pub const NAME: &str = "FileController";

fn file_ref_rules() -> Vec<ValidationRule> {
    vec![
        ValidationRule::required("fileId").with_message("File ID is required"),
        ValidationRule::required("userId").with_message("User ID is required"),
    ]
}

fn schema() -> ValidationSchema {
    ValidationSchema::new()
        .operation(
            "uploadFile",
            vec![
                ValidationRule::required("userId").with_message("User ID is required"),
                ValidationRule::required("fileName").with_message("File name is required"),
                ValidationRule::max_length("fileName", 255)
                    .with_message("File name must be at most 255 characters"),
                ValidationRule::number("fileSize").with_message("File size must be a number"),
            ],
        )
        .operation("downloadFile", file_ref_rules())
        .operation("getFileInfo", file_ref_rules())
        .operation("deleteFile", file_ref_rules())
        .operation(
            "searchFiles",
            vec![
                ValidationRule::required("userId").with_message("User ID is required"),
                ValidationRule::string("query").with_message("Search query must be a string"),
            ],
        )
        .operation(
            "getFileStats",
            vec![ValidationRule::required("userId").with_message("User ID is required")],
        )
        .operation("updateFileTags", file_ref_rules())
}

fn file_ref(file_id: &str, user_id: &str) -> FileRef {
    FileRef {
        file_id: file_id.to_string(),
        user_id: user_id.to_string(),
    }
}

/// Upload, download, metadata and deletion of shared files.
pub struct FileController {
    core: ControllerCore,
    services: FileServices,
    access: Access,
}

impl std::fmt::Debug for FileController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileController").field("core", &self.core).finish_non_exhaustive()
    }
}

impl FileController {
    /// Creates the controller and registers its validation rules.
    pub fn new(settings: &ControllerSettings, services: &Services) -> Self {
        let core = ControllerCore::new(NAME, settings).with_schema(schema());
        let access = Access::new(services, core.logger());
        Self {
            core,
            services: services.file.clone(),
            access,
        }
    }

    /// Stores a file. Without a channel the upload is checked against `global`.
    pub async fn upload_file(&self, upload: FileUpload) -> Result<FileInfo, ClassifiedError> {
        self.core
            .execute_as(Some(&upload.user_id), "uploadFile", &upload, || async {
                let scope = upload.channel_id.as_deref().unwrap_or("global");
                self.access
                    .require(PermissionRequest::new(&upload.user_id, "file", "upload_file").on(scope))
                    .await?;
                let info = self.services.upload.execute(upload.clone()).await?;
                self.access
                    .record(
                        ActivityEntry::new(&upload.user_id, "FILE_UPLOAD", "file")
                            .on(&info.id)
                            .with_details(json!({
                                "fileName": info.file_name,
                                "fileSize": info.file_size,
                                "fileType": info.mime_type,
                                "channelId": upload.channel_id,
                            })),
                    )
                    .await;
                Ok(info)
            })
            .await
    }

    /// Resolves a download URL.
    pub async fn download_file(&self, file_id: &str, user_id: &str) -> Result<FileDownload, ClassifiedError> {
        let request = file_ref(file_id, user_id);
        self.core
            .execute_as(Some(user_id), "downloadFile", &request, || async {
                self.access
                    .require(PermissionRequest::new(user_id, "file", "download_file").on(file_id))
                    .await?;
                let download = self.services.download.execute(request.clone()).await?;
                self.access
                    .record(
                        ActivityEntry::new(user_id, "FILE_DOWNLOAD", "file")
                            .on(file_id)
                            .with_details(json!({ "fileName": download.file_name })),
                    )
                    .await;
                Ok(download)
            })
            .await
    }

    /// Reads file metadata.
    pub async fn get_file_info(&self, file_id: &str, user_id: &str) -> Result<FileInfo, ClassifiedError> {
        let request = file_ref(file_id, user_id);
        self.core
            .execute_as(Some(user_id), "getFileInfo", &request, || async {
                self.access
                    .require(PermissionRequest::new(user_id, "file", "view_file").on(file_id))
                    .await?;
                self.services.info.execute(request.clone()).await
            })
            .await
    }

    /// Deletes a file.
    pub async fn delete_file(&self, file_id: &str, user_id: &str) -> Result<(), ClassifiedError> {
        let request = file_ref(file_id, user_id);
        self.core
            .execute_as(Some(user_id), "deleteFile", &request, || async {
                self.access
                    .require(PermissionRequest::new(user_id, "file", "delete_file").on(file_id))
                    .await?;
                self.services.delete.execute(request.clone()).await?;
                self.forget_cached_reads();
                self.access
                    .record(
                        ActivityEntry::new(user_id, "FILE_DELETED", "file")
                            .on(file_id)
                            .with_details(json!({ "deletedBy": user_id })),
                    )
                    .await;
                Ok(())
            })
            .await
    }

    /// Searches the files visible to a user.
    pub async fn search_files(&self, search: FileSearch) -> Result<Vec<FileInfo>, ClassifiedError> {
        self.core
            .execute_as(Some(&search.user_id), "searchFiles", &search, || async {
                self.access
                    .require(PermissionRequest::new(&search.user_id, "file", "search_files"))
                    .await?;
                self.services.search.execute(search.clone()).await
            })
            .await
    }

    /// Summarizes the files a user uploaded.
    pub async fn get_file_stats(&self, user_id: &str) -> Result<FileStats, ClassifiedError> {
        let request = UserRef {
            user_id: user_id.to_string(),
        };
        self.core
            .execute_as(Some(user_id), "getFileStats", &request, || async {
                self.access
                    .require(PermissionRequest::new(user_id, "file", "view_stats"))
                    .await?;
                let files = self.services.uploaded_by.execute(request.clone()).await?;
                Ok(FileStats::from_files(&files))
            })
            .await
    }

    /// Replaces the tags of a file.
    pub async fn update_file_tags(
        &self,
        file_id: &str,
        user_id: &str,
        tags: Vec<String>,
    ) -> Result<FileInfo, ClassifiedError> {
        let update = FileTagsUpdate {
            file_id: file_id.to_string(),
            user_id: user_id.to_string(),
            tags,
        };
        self.core
            .execute_as(Some(user_id), "updateFileTags", &update, || async {
                self.access
                    .require(PermissionRequest::new(user_id, "file", "update_file").on(file_id))
                    .await?;
                let info = self.services.update_tags.execute(update.clone()).await?;
                self.forget_cached_reads();
                self.access
                    .record(
                        ActivityEntry::new(user_id, "FILE_TAGS_UPDATED", "file")
                            .on(file_id)
                            .with_details(json!({ "fileName": info.file_name, "newTags": info.tags })),
                    )
                    .await;
                Ok(info)
            })
            .await
    }

    // cache keys hash their params, so drop the whole operations
    fn forget_cached_reads(&self) {
        for operation in ["getFileInfo", "downloadFile", "searchFiles", "getFileStats"] {
            self.core.caching().invalidate(Some(&format!("{NAME}:{operation}:")));
        }
    }
}

impl Controller for FileController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }
}
