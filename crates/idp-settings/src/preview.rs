//! LDAP Preview Gateway
//!
//! "Test connection" for an LDAP draft. Never persists and never touches
//! the active provider.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::draft::LdapDraft;
use crate::error::Result;
use crate::gateway::LdapPreviewClient;
use crate::provider::{LdapConfig, LdapPreview};

pub struct LdapPreviewGateway {
    client: Arc<dyn LdapPreviewClient>,
}

impl LdapPreviewGateway {
    pub fn new(client: Arc<dyn LdapPreviewClient>) -> Self {
        Self { client }
    }

    /// Preview a fully-formed configuration.
    pub async fn preview(&self, config: &LdapConfig) -> Result<LdapPreview> {
        debug!(host = %config.server_host, port = config.server_port, "Running LDAP preview");
        let preview = self.client.preview_ldap(config).await?;
        if preview.is_error {
            warn!(message = %preview.message, "LDAP preview failed");
        } else {
            debug!(
                users = preview.users.len(),
                groups = preview.groups.len(),
                "LDAP preview succeeded"
            );
        }
        Ok(preview)
    }

    /// Preview the draft as typed. An unparseable port fails locally.
    pub async fn preview_draft(&self, draft: &LdapDraft) -> Result<LdapPreview> {
        match draft.trimmed().to_config() {
            Some(config) => self.preview(&config).await,
            None => Ok(LdapPreview::failed("Invalid server port")),
        }
    }
}
