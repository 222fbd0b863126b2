/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Longest lifetime an access token may be issued for
pub const MAX_ACCESS_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Role carried by regular user sessions
pub const ROLE_USER: &str = "user";

/// Primary administrator, may manage other admins
pub const ROLE_ADMIN: &str = "Admin";

/// Secondary administrator with write access to restore and unblock flows
pub const ROLE_SENIOR_ADMIN: &str = "Senior Admin";

/// Secondary administrator with read-only access
pub const ROLE_JUNIOR_ADMIN: &str = "Junior Admin";

// =============================================================================
// STORAGE PREFIXES
// =============================================================================

pub const FILES_PREFIX: &str = "files";

pub const AVATARS_PREFIX: &str = "avatars";
