// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

use clinic_core::{RoleId, UserId};

use crate::{
    Ability, AuthzContext, Decision, DenialReason, EvaluationMode, Gate, Grant, Permission,
    PermissionTable, Session, authorize::ownership_key,
};

/// Detailed explanation of an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub ability: String,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    /// `None` when nobody is logged in.
    pub principal: Option<PrincipalState>,
    pub grant: Option<Grant>,
    pub denial: Option<DenialExplanation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub principal_id: UserId,
    pub role_id: RoleId,
    pub role: Option<String>,
    pub effective_permissions: Vec<String>,
    pub has_wildcard: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialExplanation {
    pub reason: DenialReason,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl Gate {
    /// Explain why `ability` is (or would be) allowed or denied for the session.
    ///
    /// Evaluates exactly like [`Gate::authorize`], including ownership lookups.
    pub fn explain(&self, session: &mut Session, ability: impl Into<Ability>, ctx: &AuthzContext) -> AuthorizationExplanation {
        let ability = ability.into();
        let decision = self.evaluate(session, &ability, ctx, EvaluationMode::Enforce, Utc::now());

        let principal = session.principal().map(|p| {
            let perms = p
                .role()
                .map_or(PermissionTable::no_permissions(), |r| self.table().permissions_for(r.as_str()));
            let mut effective_permissions: Vec<String> = perms.iter().map(|p| p.as_str().to_string()).collect();
            effective_permissions.sort();
            PrincipalState {
                principal_id: p.id,
                role_id: p.role_id,
                role: p.role().map(|r| r.as_str().to_string()),
                has_wildcard: perms.iter().any(Permission::is_wildcard),
                effective_permissions,
            }
        });

        match decision {
            Decision::Unauthenticated => AuthorizationExplanation {
                ability: ability.as_str().to_string(),
                granted: false,
                reason: "No authenticated principal in session".to_string(),
                principal: None,
                grant: None,
                denial: None,
            },
            Decision::Allowed(grant) => AuthorizationExplanation {
                ability: ability.as_str().to_string(),
                granted: true,
                reason: grant_reason(grant, &ability),
                principal,
                grant: Some(grant),
                denial: None,
            },
            Decision::Denied(reason) => {
                let role = principal.as_ref().and_then(|p| p.role.clone());
                AuthorizationExplanation {
                    ability: ability.as_str().to_string(),
                    granted: false,
                    reason: format!(
                        "Role '{}' may not perform '{}': {}",
                        role.as_deref().unwrap_or("<unresolved>"),
                        ability,
                        reason
                    ),
                    principal,
                    grant: None,
                    denial: Some(DenialExplanation {
                        message: denial_message(&reason, &ability),
                        suggestions: suggestions(self.table(), &reason, &ability),
                        reason,
                    }),
                }
            }
        }
    }
}

fn grant_reason(grant: Grant, ability: &Ability) -> String {
    match grant {
        Grant::AdminRole => "Principal has the admin role".to_string(),
        Grant::Wildcard => "Role holds the wildcard permission '*'".to_string(),
        Grant::ExactPermission => format!("Role holds permission '{ability}'"),
        Grant::AllScope => format!("Role holds the unrestricted '_all' permission for '{ability}'"),
        Grant::Assigned => format!("Principal is the assigned doctor for the resource in '{ability}'"),
        Grant::AssignedViaPatient => {
            "Principal is assigned to the prescription's patient".to_string()
        }
    }
}

fn denial_message(reason: &DenialReason, ability: &Ability) -> String {
    match reason {
        DenialReason::NoMatchingPermission => format!("No permission covers '{ability}'"),
        DenialReason::MissingContext { key } => {
            format!("'{ability}' is granted only for assigned resources and no '{key}' was supplied")
        }
        DenialReason::NotAssigned => "Principal is not the assigned doctor for this resource".to_string(),
        DenialReason::OracleUnavailable => "Ownership could not be verified".to_string(),
    }
}

fn suggestions(table: &PermissionTable, reason: &DenialReason, ability: &Ability) -> Vec<String> {
    let mut out = Vec::new();

    if let DenialReason::MissingContext { key } = reason {
        out.push(format!("Pass '{key}' in the authorization context"));
    }

    let granting: Vec<&str> = table
        .roles()
        .into_iter()
        .filter(|role| role_could_grant(table.permissions_for(role.as_str()), ability))
        .map(|role| role.as_str())
        .collect();
    if !granting.is_empty() {
        out.push(format!("Roles that can be granted '{ability}': {granting:?}"));
    }

    out.push(format!("Grant '{ability}' to the principal's role"));
    out
}

fn role_could_grant(perms: &std::collections::HashSet<Permission>, ability: &Ability) -> bool {
    if perms.contains(Permission::WILDCARD) || perms.contains(ability.as_str()) {
        return true;
    }
    match ability.granular() {
        Some((resource, action)) => {
            perms.contains(resource.all_permission(action).as_str())
                || perms.contains(resource.assigned_permission(action).as_str())
        }
        None => false,
    }
}

/// Role definition with its granted permissions (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: String,
    pub permissions: Vec<String>,
    pub description: Option<String>,
}

/// Permission definition (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct PermissionDefinition {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Context key required when this is an `_assigned` permission.
    pub requires_context: Option<&'static str>,
}

/// Complete view of the role/permission table for auditing.
#[derive(Debug, Clone, Serialize)]
pub struct RbacRegistry {
    pub roles: BTreeMap<String, RoleDefinition>,
    pub permissions: BTreeMap<String, PermissionDefinition>,
}

impl RbacRegistry {
    pub fn from_table(table: &PermissionTable) -> Self {
        let mut roles = BTreeMap::new();
        let mut permissions = BTreeMap::new();

        for role in table.roles() {
            let mut perms: Vec<String> = table
                .permissions_for(role.as_str())
                .iter()
                .map(|p| p.as_str().to_string())
                .collect();
            perms.sort();

            for perm in &perms {
                permissions.entry(perm.clone()).or_insert_with(|| PermissionDefinition {
                    name: perm.clone(),
                    description: permission_description(perm),
                    category: permission_category(perm),
                    requires_context: required_context(perm),
                });
            }

            roles.insert(
                role.as_str().to_string(),
                RoleDefinition {
                    name: role.as_str().to_string(),
                    permissions: perms,
                    description: role_description(role.as_str()),
                },
            );
        }

        Self { roles, permissions }
    }
}

fn role_description(role: &str) -> Option<String> {
    let text = match role {
        "admin" => "Full system administrator with all permissions",
        "medical_manager" => "Oversees clinical staff; full access to patient and medical records",
        "registrar" => "Front desk; manages patient registration and appointment booking",
        "doctor" => "Physician; access limited to patients and orders they are assigned to",
        "nurse" => "Reads clinical records; acts on prescriptions of assigned patients",
        "lab_technician" => "Processes lab orders and records results",
        "billing" => "Manages invoices and payments",
        "inventory_manager" => "Manages stock of medicines and supplies",
        _ => return None,
    };
    Some(text.to_string())
}

fn permission_description(perm: &str) -> Option<String> {
    if perm == Permission::WILDCARD {
        return Some("Wildcard permission - grants all permissions".to_string());
    }

    let (resource, action) = perm.split_once('.')?;
    let desc = match action {
        "read" => format!("View {resource}"),
        "write" => format!("Create/update {resource}"),
        "read_all" => format!("View all {resource}"),
        "write_all" => format!("Create/update any {resource}"),
        "read_assigned" => format!("View {resource} of assigned patients"),
        "write_assigned" => format!("Create/update {resource} of assigned patients"),
        "manage" => format!("Manage {resource}"),
        other => format!("{other} {resource}"),
    };
    Some(desc)
}

fn permission_category(perm: &str) -> Option<String> {
    if perm == Permission::WILDCARD {
        return Some("system".to_string());
    }
    perm.split_once('.').map(|(resource, _)| resource.to_string())
}

fn required_context(perm: &str) -> Option<&'static str> {
    let (resource, action) = perm.split_once('.')?;
    let action = action.strip_suffix("_assigned")?;
    let ability = Ability::new(format!("{resource}.{action}"));
    ability.granular().map(|(resource, _)| ownership_key(resource))
}
