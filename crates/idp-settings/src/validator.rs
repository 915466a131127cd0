//! Field Validator
//!
//! Pure checks over the current draft. Each provider declares its required
//! fields in a fixed order; the first invalid one is what callers focus on.

use std::fmt;

use serde::Serialize;

use crate::draft::{parse_port, KeycloakDraft, LdapDraft, OAuth2Draft, ProviderDraft};

/// Identifier of a validated form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum Field {
    KeycloakUrl,
    KeycloakRealm,
    KeycloakClientId,
    KeycloakPublicKey,
    KeycloakAdminUser,
    KeycloakAdminPassword,
    OAuth2AuthUrl,
    OAuth2TokenUrl,
    OAuth2ClientId,
    OAuth2Secret,
    OAuth2Scope,
    LdapServerHost,
    LdapServerPort,
    LdapBindDn,
    LdapBindPassword,
    LdapFilter,
    LdapAttributeUserRdn,
    LdapAttributeUserFirstname,
    LdapAttributeUserLastname,
    LdapAttributeUserEmail,
    LdapAttributeGroupMember,
}

impl Field {
    pub fn id(&self) -> &'static str {
        match self {
            Field::KeycloakUrl => "keycloak-url",
            Field::KeycloakRealm => "keycloak-realm",
            Field::KeycloakClientId => "keycloak-clientId",
            Field::KeycloakPublicKey => "keycloak-publicKey",
            Field::KeycloakAdminUser => "keycloak-admin-user",
            Field::KeycloakAdminPassword => "keycloak-admin-password",
            Field::OAuth2AuthUrl => "oauth2-auth-url",
            Field::OAuth2TokenUrl => "oauth2-token-url",
            Field::OAuth2ClientId => "oauth2-clientId",
            Field::OAuth2Secret => "oauth2-secret",
            Field::OAuth2Scope => "oauth2-scope",
            Field::LdapServerHost => "ldap-host",
            Field::LdapServerPort => "ldap-port",
            Field::LdapBindDn => "ldap-bindDN",
            Field::LdapBindPassword => "ldap-bindPassword",
            Field::LdapFilter => "ldap-userFilter",
            Field::LdapAttributeUserRdn => "ldap-attributeUserRDN",
            Field::LdapAttributeUserFirstname => "ldap-attributeUserFirstname",
            Field::LdapAttributeUserLastname => "ldap-attributeUserLastname",
            Field::LdapAttributeUserEmail => "ldap-attributeUserEmail",
            Field::LdapAttributeGroupMember => "ldap-attributeGroupMember",
        }
    }
}

impl From<Field> for &'static str {
    fn from(field: Field) -> Self {
        field.id()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Switches for checks whose observed behaviour is ambiguous
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Flag an empty OAuth2 scope. Off by default: scope was never checked.
    pub require_oauth2_scope: bool,
}

impl From<&idp_config::ValidationConfig> for ValidationPolicy {
    fn from(config: &idp_config::ValidationConfig) -> Self {
        Self {
            require_oauth2_scope: config.require_oauth2_scope,
        }
    }
}

/// Per-field "is invalid" flags in declared order. Derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    checks: Vec<(Field, bool)>,
}

impl ValidationReport {
    fn check(&mut self, field: Field, invalid: bool) {
        self.checks.push((field, invalid));
    }

    pub fn is_valid(&self) -> bool {
        self.checks.iter().all(|(_, invalid)| !invalid)
    }

    pub fn is_invalid(&self, field: Field) -> bool {
        self.checks
            .iter()
            .any(|(f, invalid)| *f == field && *invalid)
    }

    /// First invalid field in declared order
    pub fn first_invalid(&self) -> Option<Field> {
        self.invalid_fields().next()
    }

    pub fn invalid_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.checks
            .iter()
            .filter(|(_, invalid)| *invalid)
            .map(|(field, _)| *field)
    }

    /// Every field checked, valid or not
    pub fn checked_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.checks.iter().map(|(field, _)| *field)
    }
}

/// Validate the draft for its provider.
pub fn validate(draft: &ProviderDraft, policy: ValidationPolicy) -> ValidationReport {
    match draft {
        ProviderDraft::Native => ValidationReport::default(),
        ProviderDraft::Keycloak(d) => validate_keycloak(d),
        ProviderDraft::OAuth2(d) => validate_oauth2(d, policy),
        ProviderDraft::Ldap(d) => validate_ldap(d),
    }
}

fn validate_keycloak(d: &KeycloakDraft) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.check(Field::KeycloakUrl, d.url.is_empty());
    report.check(Field::KeycloakRealm, d.realm.is_empty());
    report.check(Field::KeycloakClientId, d.client_id.is_empty());
    report.check(Field::KeycloakPublicKey, d.public_key.is_empty());
    report.check(Field::KeycloakAdminUser, d.admin_user.is_empty());
    report.check(Field::KeycloakAdminPassword, d.admin_password.is_empty());
    report
}

fn validate_oauth2(d: &OAuth2Draft, policy: ValidationPolicy) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.check(Field::OAuth2AuthUrl, d.auth_url.is_empty());
    report.check(Field::OAuth2TokenUrl, d.token_url.is_empty());
    report.check(Field::OAuth2ClientId, d.client_id.is_empty());
    report.check(Field::OAuth2Secret, d.secret.is_empty());
    if policy.require_oauth2_scope {
        report.check(Field::OAuth2Scope, d.scope.is_empty());
    }
    report
}

fn validate_ldap(d: &LdapDraft) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.check(Field::LdapServerHost, d.server_host.is_empty());
    report.check(Field::LdapServerPort, parse_port(&d.server_port).is_none());
    report.check(Field::LdapBindDn, d.bind_dn.is_empty());
    report.check(Field::LdapBindPassword, d.bind_password.is_empty());
    report.check(
        Field::LdapFilter,
        d.user_filter.is_empty() && d.group_filter.is_empty(),
    );
    report.check(Field::LdapAttributeUserRdn, d.attribute_user_rdn.is_empty());
    report.check(
        Field::LdapAttributeUserFirstname,
        d.attribute_user_firstname.is_empty(),
    );
    report.check(
        Field::LdapAttributeUserLastname,
        d.attribute_user_lastname.is_empty(),
    );
    report.check(Field::LdapAttributeUserEmail, d.attribute_user_email.is_empty());
    report.check(Field::LdapAttributeGroupMember, d.missing_group_member());
    report
}
