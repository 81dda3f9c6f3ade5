use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::Response;

use clinic_auth::AuthzContext;

use crate::app::errors;

pub mod authz;
pub mod rbac;
pub mod system;

/// Split `?ability=…&k=v…` into the ability and an authorization context.
///
/// Keys listed in `reserved` are dropped from the context.
pub(crate) fn ability_and_context(
    mut params: HashMap<String, String>,
    reserved: &[&str],
) -> Result<(String, AuthzContext), Response> {
    let ability = params
        .remove("ability")
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| errors::json_error(StatusCode::BAD_REQUEST, "missing_ability", "ability is required"))?;

    let ctx = params
        .into_iter()
        .filter(|(k, _)| !reserved.contains(&k.as_str()))
        .collect::<AuthzContext>();

    Ok((ability, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_params_become_context() {
        let params: HashMap<String, String> = [
            ("ability", "patients.read"),
            ("patient_id", "100"),
            ("as_role", "doctor"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let (ability, ctx) = ability_and_context(params, &["as_role"]).unwrap();
        assert_eq!(ability, "patients.read");
        assert_eq!(ctx.id("patient_id"), Some(100));
        assert!(ctx.get("as_role").is_none());
    }

    #[test]
    fn ability_is_required() {
        let res = ability_and_context(HashMap::new(), &[]).unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
