use super::*;

#[test]
fn http_status_mapping() {
    assert_eq!(AppError::user("bad_input", "oops").http_status(), 400);
    assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
    assert_eq!(AppError::conflict("conflict", "dup").http_status(), 409);
    assert_eq!(AppError::auth("auth", "no").http_status(), 401);
    assert_eq!(AppError::io("io", "io").http_status(), 503);
    assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
}

#[test]
fn display_joins_code_and_message() {
    let e = AppError::conflict("email_taken", "Email already registered");
    assert_eq!(e.to_string(), "email_taken: Email already registered");
    assert_eq!(e.code_str(), "email_taken");
    assert_eq!(e.message(), "Email already registered");
}

#[test]
fn serializes_with_type_tag() {
    let v = serde_json::to_value(AppError::auth("invalid_credentials", "Invalid email or password")).unwrap();
    assert_eq!(v["type"], "auth");
    assert_eq!(v["code"], "invalid_credentials");
}

#[test]
fn anyhow_maps_to_internal() {
    let e: AppError = anyhow::anyhow!("boom").into();
    assert_eq!(e.http_status(), 500);
    assert_eq!(e.message(), "boom");
}
