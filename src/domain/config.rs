use serde::Deserialize;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub services: ServicesConfig,
    pub community: CommunityConfig,
    #[serde(default)]
    pub groups: GroupsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Configuration for various connected services.
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub matrix: MatrixConfig,
}

/// Specific configuration for the Matrix service.
#[derive(Debug, Deserialize, Clone)]
pub struct MatrixConfig {
    pub username: String,
    pub password: String,
    pub homeserver: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// The community the bot serves: which room it watches for pings,
/// who its moderators are, and where maintenance traffic goes.
#[derive(Debug, Deserialize, Clone)]
pub struct CommunityConfig {
    /// Room ID watched for `!ping` requests.
    pub ping_room: String,
    /// Optional room that receives parse warnings and operational notices.
    #[serde(default)]
    pub admin_room: Option<String>,
    /// User IDs allowed to run moderator-only commands.
    #[serde(default)]
    pub moderators: Vec<String>,
}

impl CommunityConfig {
    pub fn is_moderator(&self, user: &str) -> bool {
        self.moderators.iter().any(|m| m.eq_ignore_ascii_case(user))
    }
}

/// Where the membership and policy documents live. The public/protected
/// flags themselves are runtime state (moderators toggle them with
/// `makepublicgroup`/`protectgroup` and friends), so they sit in the policy
/// document, not here.
#[derive(Debug, Deserialize, Clone)]
pub struct GroupsConfig {
    /// Path of the membership document handled by the document store.
    #[serde(default = "default_document_path")]
    pub document_path: String,
    /// Path of the group policy document (public/protected lists).
    #[serde(default = "default_policy_path")]
    pub policy_path: String,
}

fn default_document_path() -> String {
    "data/groups.conf".to_string()
}

fn default_policy_path() -> String {
    "data/policy.conf".to_string()
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            document_path: default_document_path(),
            policy_path: default_policy_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Upper bound on distinct groups a single message may ping.
    #[serde(default = "default_max_pings")]
    pub max_pings_per_message: usize,
}

fn default_max_pings() -> usize {
    3
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_pings_per_message: default_max_pings(),
        }
    }
}
