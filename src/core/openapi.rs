use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::access_tokens::{dtos as tokens_dtos, handlers as tokens_handlers};
use crate::features::admin::{
    dtos as admin_dtos, handlers as admin_handlers, models as admin_models,
};
use crate::features::audit::{dtos as audit_dtos, models as audit_models};
use crate::features::auth;
use crate::features::files::{
    dtos as files_dtos, handlers as files_handlers, models as files_models,
};
use crate::features::recycle_bin::{
    dtos as recycle_bin_dtos, handlers as recycle_bin_handlers, models as recycle_bin_models,
};
use crate::features::shares::{dtos as shares_dtos, handlers as shares_handlers};
use crate::features::users::{dtos as users_dtos, handlers::profile_handler, models as users_models};
use crate::modules::scanner::ScanVerdict;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::sign_up,
        auth::handlers::sign_in,
        auth::handlers::get_me,
        // Users
        profile_handler::get_profile,
        profile_handler::update_profile,
        profile_handler::upload_avatar,
        profile_handler::set_pin,
        profile_handler::deactivate_account,
        // Files
        files_handlers::upload_file,
        files_handlers::list_files,
        files_handlers::get_file,
        files_handlers::replace_file,
        files_handlers::delete_file,
        files_handlers::verify_pin,
        files_handlers::request_unblock,
        files_handlers::verify_unblock,
        files_handlers::download_file,
        files_handlers::start_scan,
        files_handlers::check_scan,
        // Shares
        shares_handlers::share_file,
        shares_handlers::list_file_shares,
        shares_handlers::revoke_share,
        shares_handlers::list_share_candidates,
        shares_handlers::list_shared_with_me,
        shares_handlers::leave_share,
        shares_handlers::verify_shared_pin,
        // Recycle bin
        recycle_bin_handlers::list_bin,
        recycle_bin_handlers::request_restore,
        recycle_bin_handlers::confirm_restore,
        recycle_bin_handlers::purge,
        // Access tokens
        tokens_handlers::issue_token,
        tokens_handlers::validate_token,
        // Admin
        admin_handlers::sign_in,
        admin_handlers::list_admins,
        admin_handlers::create_admin,
        admin_handlers::update_admin,
        admin_handlers::delete_admin,
        admin_handlers::list_restore_requests,
        admin_handlers::approve_restore,
        admin_handlers::reject_restore,
        admin_handlers::list_blocked_files,
        admin_handlers::unblock_file,
        admin_handlers::list_audit_logs,
        admin_handlers::list_users,
        admin_handlers::set_user_status,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::dtos::SignUpRequestDto,
            auth::dtos::SignInRequestDto,
            auth::dtos::SessionResponseDto,
            auth::dtos::MeResponseDto,
            ApiResponse<auth::dtos::SessionResponseDto>,
            ApiResponse<auth::dtos::MeResponseDto>,
            // Users
            users_models::AccountStatus,
            users_dtos::UserProfileDto,
            users_dtos::UpdateProfileDto,
            users_dtos::SetPinDto,
            users_dtos::DeactivateAccountDto,
            users_dtos::DeactivateAccountResponseDto,
            ApiResponse<users_dtos::UserProfileDto>,
            ApiResponse<Vec<users_dtos::UserProfileDto>>,
            ApiResponse<users_dtos::DeactivateAccountResponseDto>,
            // Files
            files_models::FileStatus,
            ScanVerdict,
            files_dtos::UploadFileDto,
            files_dtos::FileResponseDto,
            files_dtos::VerifyPinDto,
            files_dtos::VerifyOtpDto,
            files_dtos::AccessGrantDto,
            files_dtos::UnblockRequestedDto,
            files_dtos::DeleteFileResponseDto,
            files_dtos::ScanSubmittedDto,
            files_dtos::ScanStatusDto,
            ApiResponse<files_dtos::FileResponseDto>,
            ApiResponse<Vec<files_dtos::FileResponseDto>>,
            ApiResponse<files_dtos::AccessGrantDto>,
            ApiResponse<files_dtos::UnblockRequestedDto>,
            ApiResponse<files_dtos::DeleteFileResponseDto>,
            ApiResponse<files_dtos::ScanSubmittedDto>,
            ApiResponse<files_dtos::ScanStatusDto>,
            // Shares
            shares_dtos::ShareFileDto,
            shares_dtos::ShareRecipientResultDto,
            shares_dtos::ShareFileResponseDto,
            shares_dtos::IncomingShareDto,
            shares_dtos::OutgoingShareDto,
            shares_dtos::ShareCandidateDto,
            shares_dtos::SharedAccessDto,
            shares_dtos::ShareRemovedDto,
            ApiResponse<shares_dtos::ShareFileResponseDto>,
            ApiResponse<Vec<shares_dtos::IncomingShareDto>>,
            ApiResponse<Vec<shares_dtos::OutgoingShareDto>>,
            ApiResponse<Vec<shares_dtos::ShareCandidateDto>>,
            ApiResponse<shares_dtos::SharedAccessDto>,
            ApiResponse<shares_dtos::ShareRemovedDto>,
            // Recycle bin
            recycle_bin_models::RecycleStatus,
            recycle_bin_dtos::RecycleBinEntryDto,
            recycle_bin_dtos::RestoreStatusDto,
            recycle_bin_dtos::RestoreOutcomeDto,
            recycle_bin_dtos::PurgeResponseDto,
            ApiResponse<Vec<recycle_bin_dtos::RecycleBinEntryDto>>,
            ApiResponse<recycle_bin_dtos::RestoreStatusDto>,
            ApiResponse<recycle_bin_dtos::RestoreOutcomeDto>,
            ApiResponse<recycle_bin_dtos::PurgeResponseDto>,
            // Access tokens
            tokens_dtos::IssueTokenDto,
            tokens_dtos::IssuedTokenDto,
            tokens_dtos::ValidateTokenDto,
            tokens_dtos::TokenValidationDto,
            ApiResponse<tokens_dtos::IssuedTokenDto>,
            ApiResponse<tokens_dtos::TokenValidationDto>,
            // Audit
            audit_models::AuditAction,
            audit_dtos::AuditLogDto,
            ApiResponse<Vec<audit_dtos::AuditLogDto>>,
            // Admin
            admin_models::AdminRole,
            admin_dtos::AdminDto,
            admin_dtos::CreateAdminDto,
            admin_dtos::UpdateAdminDto,
            admin_dtos::AdminSessionResponseDto,
            admin_dtos::AdminDeletedDto,
            admin_dtos::BlockedFileDto,
            admin_dtos::UpdateAccountStatusDto,
            ApiResponse<admin_dtos::AdminSessionResponseDto>,
            ApiResponse<Vec<admin_dtos::AdminDto>>,
            ApiResponse<admin_dtos::AdminDto>,
            ApiResponse<admin_dtos::AdminDeletedDto>,
            ApiResponse<Vec<admin_dtos::BlockedFileDto>>,
        )
    ),
    tags(
        (name = "auth", description = "User sign-up and sign-in"),
        (name = "users", description = "User profile, PIN and account management"),
        (name = "files", description = "File library, PIN gate, unblock and download"),
        (name = "scans", description = "Standalone malware scans"),
        (name = "shares", description = "PIN-protected file sharing"),
        (name = "recycle-bin", description = "Soft-deleted files and restore workflow"),
        (name = "tokens", description = "Time-boxed file access tokens"),
        (name = "admin", description = "Admin panel"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "SecuredTrans API",
        version = "0.1.0",
        description = "API documentation for SecuredTrans",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/files/{id}/access"));
        assert!(paths.contains_key("/api/shares/{file_id}/access"));
        assert!(paths.contains_key("/api/recycle-bin/{id}/confirm"));
        assert!(paths.contains_key("/api/admin/blocked-files"));
        assert!(paths.contains_key("/api/tokens/validate"));
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_info_modifier_overrides_title() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Custom".to_string(),
            version: "9.9.9".to_string(),
            description: "desc".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Custom");
        assert_eq!(doc.info.version, "9.9.9");
    }
}
