//! Shape validation for raw request payloads.
//!
//! Each function takes the parsed JSON body and returns either a typed value
//! or every violation found, never both. Only presence, types and enum
//! membership are checked here; lengths and formats are enforced by
//! [`customer::check`](crate::customer::check) when the store writes.

use serde_json::{Map, Value};

use crate::customer::{CustomerPatch, NewCustomer, Profile, Role};

/// The login payload accepted by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub user_name: String,
  pub password:  String,
}

/// Collects violations while reading fields out of a JSON object.
struct Fields<'a> {
  object:     &'a Map<String, Value>,
  violations: Vec<String>,
}

impl<'a> Fields<'a> {
  fn of(value: &'a Value) -> Result<Self, Vec<String>> {
    value
      .as_object()
      .map(|object| Self { object, violations: Vec::new() })
      .ok_or_else(|| vec!["Request body must be a JSON object".to_owned()])
  }

  /// A missing key and an explicit `null` are both treated as absent.
  fn get(&self, key: &str) -> Option<&'a Value> {
    self.object.get(key).filter(|v| !v.is_null())
  }

  fn required_str(&mut self, key: &str, label: &str) -> Option<String> {
    match self.get(key) {
      None => {
        self.violations.push(format!("{label} is required"));
        None
      }
      some => self.string(some, label),
    }
  }

  fn optional_str(&mut self, key: &str, label: &str) -> Option<String> {
    let value = self.get(key);
    self.string(value, label)
  }

  fn string(&mut self, value: Option<&Value>, label: &str) -> Option<String> {
    match value? {
      Value::String(s) => Some(s.clone()),
      _ => {
        self.violations.push(format!("{label} must be a string"));
        None
      }
    }
  }

  fn optional_bool(&mut self, key: &str, label: &str) -> Option<bool> {
    match self.get(key)? {
      Value::Bool(b) => Some(*b),
      _ => {
        self.violations.push(format!("{label} must be a boolean"));
        None
      }
    }
  }

  fn optional_role(&mut self, key: &str) -> Option<Role> {
    let raw = self.optional_str(key, "Role")?;
    match raw.parse::<Role>() {
      Ok(role) => Some(role),
      Err(_) => {
        self.violations.push(format!(
          "Role must be one of: {}, {} (got {raw:?})",
          Role::Admin,
          Role::Agent
        ));
        None
      }
    }
  }

  fn optional_profile(&mut self, key: &str) -> Option<Profile> {
    let value = self.get(key)?;
    let Some(object) = value.as_object() else {
      self.violations.push("Profile must be an object".to_owned());
      return None;
    };
    let mut inner = Fields { object, violations: Vec::new() };
    let profile = Profile {
      phone:  inner.optional_str("phone", "Profile phone"),
      avatar: inner.optional_str("avatar", "Profile avatar"),
      bio:    inner.optional_str("bio", "Profile bio"),
    };
    self.violations.append(&mut inner.violations);
    Some(profile)
  }

  fn finish<T>(self, value: Option<T>) -> Result<T, Vec<String>> {
    match value {
      Some(v) if self.violations.is_empty() => Ok(v),
      _ => Err(self.violations),
    }
  }
}

/// Validate the body of `POST /customers`.
pub fn new_customer(body: &Value) -> Result<NewCustomer, Vec<String>> {
  let mut f = Fields::of(body)?;
  let document = f.required_str("document", "Document");
  let name = f.required_str("name", "Name");
  let email = f.required_str("email", "Email");
  let role = f.optional_role("role");
  let is_active = f.optional_bool("isActive", "isActive");
  let profile = f.optional_profile("profile");

  let value = match (document, name, email) {
    (Some(document), Some(name), Some(email)) => Some(NewCustomer {
      document,
      name,
      email,
      role: role.unwrap_or_default(),
      is_active: is_active.unwrap_or(true),
      profile: profile.unwrap_or_default(),
    }),
    _ => None,
  };
  f.finish(value)
}

/// Validate the body of `PUT /customers/{id}`. Every field is optional;
/// `document` is rejected because it cannot change after creation. Unknown
/// keys are ignored.
pub fn customer_patch(body: &Value) -> Result<CustomerPatch, Vec<String>> {
  let mut f = Fields::of(body)?;
  if f.get("document").is_some() {
    f.violations
      .push("Document cannot be changed after creation".to_owned());
  }
  let patch = CustomerPatch {
    name:      f.optional_str("name", "Name"),
    email:     f.optional_str("email", "Email"),
    role:      f.optional_role("role"),
    is_active: f.optional_bool("isActive", "isActive"),
    profile:   f.optional_profile("profile"),
  };
  f.finish(Some(patch))
}

/// Validate the body of `POST /auth/token`.
pub fn credentials(body: &Value) -> Result<Credentials, Vec<String>> {
  let mut f = Fields::of(body)?;
  let user_name = f.required_str("userName", "userName");
  let password = f.required_str("password", "password");
  let value = match (user_name, password) {
    (Some(user_name), Some(password)) => Some(Credentials { user_name, password }),
    _ => None,
  };
  f.finish(value)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn minimal_customer_gets_defaults() {
    let input = new_customer(&json!({
      "document": "12345678901",
      "name": "Jo",
      "email": "jo@x.com"
    }))
    .unwrap();
    assert_eq!(input.role, Role::Agent);
    assert!(input.is_active);
    assert_eq!(input.profile, Profile::default());
  }

  #[test]
  fn full_customer() {
    let input = new_customer(&json!({
      "document": "12345678901",
      "name": "Jo",
      "email": "jo@x.com",
      "role": "admin",
      "isActive": false,
      "profile": { "phone": "555", "bio": "hello" }
    }))
    .unwrap();
    assert_eq!(input.role, Role::Admin);
    assert!(!input.is_active);
    assert_eq!(input.profile.phone.as_deref(), Some("555"));
    assert_eq!(input.profile.avatar, None);
  }

  #[test]
  fn missing_fields_are_all_reported() {
    let errs = new_customer(&json!({})).unwrap_err();
    assert_eq!(errs, vec![
      "Document is required",
      "Name is required",
      "Email is required",
    ]);
  }

  #[test]
  fn type_and_enum_violations_are_aggregated() {
    let errs = new_customer(&json!({
      "document": 12345678901u64,
      "name": "Jo",
      "email": "jo@x.com",
      "role": "owner",
      "isActive": "yes",
      "profile": { "phone": 5 }
    }))
    .unwrap_err();
    assert_eq!(errs.len(), 4, "{errs:?}");
    assert_eq!(errs[0], "Document must be a string");
    assert!(errs[1].starts_with("Role must be one of: admin, agent"));
    assert_eq!(errs[2], "isActive must be a boolean");
    assert_eq!(errs[3], "Profile phone must be a string");
  }

  #[test]
  fn non_object_body_is_rejected() {
    assert!(new_customer(&json!([1, 2])).is_err());
    assert!(customer_patch(&json!("x")).is_err());
    assert!(credentials(&Value::Null).is_err());
  }

  #[test]
  fn patch_is_partial() {
    let patch = customer_patch(&json!({ "name": "New", "extra": 1 })).unwrap();
    assert_eq!(patch, CustomerPatch {
      name: Some("New".into()),
      ..CustomerPatch::default()
    });
  }

  #[test]
  fn patch_rejects_document_change() {
    let errs = customer_patch(&json!({ "document": "10987654321" })).unwrap_err();
    assert_eq!(errs, vec!["Document cannot be changed after creation"]);
  }

  #[test]
  fn credentials_require_both_fields() {
    let creds = credentials(&json!({ "userName": "admin", "password": "admin" }))
      .unwrap();
    assert_eq!(creds.user_name, "admin");

    let errs = credentials(&json!({ "userName": "admin" })).unwrap_err();
    assert_eq!(errs, vec!["password is required"]);
  }
}
