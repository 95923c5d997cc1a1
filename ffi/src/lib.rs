//! C-ABI wrapper around the association subsystem of `hubspot-core`.
//!
//! # Overview
//! Exposes association type inference and the build/parse halves of the
//! create and remove association calls through `extern "C"` functions, so
//! any language with a C FFI can drive them while doing its own HTTP.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `hs_build_*` / `hs_parse_*` mirror the core `Associations` API 1:1.
//!   Build functions return null on failure and report why through an
//!   optional `FfiErrorCode` out-parameter.
//! - A single `FfiHsResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `hs_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use hubspot_core::{
    infer_association_type_id, Associations, ClientConfig, Definer, HttpResponse, ObjectRef,
};

use types::*;

/// Borrow a C string as `&str`.
///
/// The pointer must be null or point to a NUL-terminated string that
/// outlives the call.
fn read_str<'a>(ptr: *const c_char) -> Result<&'a str, FfiErrorCode> {
    if ptr.is_null() {
        return Err(FfiErrorCode::NullArg);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| FfiErrorCode::InvalidUtf8)
}

fn read_object_ref(type_name: *const c_char, id: *const c_char) -> Result<ObjectRef, FfiErrorCode> {
    let type_name = read_str(type_name)?;
    let id = read_str(id)?;
    ObjectRef::parse(type_name, id).map_err(|e| FfiErrorCode::from(&e))
}

fn client_ref<'a>(client: *const FfiHubSpotClient) -> Result<&'a FfiHubSpotClient, FfiErrorCode> {
    if client.is_null() {
        return Err(FfiErrorCode::NullArg);
    }
    Ok(unsafe { &*client })
}

/// Report `outcome` through the optional out-parameter and return the
/// request pointer, or null on failure.
fn finish_build(
    outcome: Result<*mut FfiHttpRequest, FfiErrorCode>,
    error_code: *mut FfiErrorCode,
) -> *mut FfiHttpRequest {
    let (ptr, code) = match outcome {
        Ok(ptr) => (ptr, FfiErrorCode::Ok),
        Err(code) => (std::ptr::null_mut(), code),
    };
    if !error_code.is_null() {
        unsafe { *error_code = code };
    }
    ptr
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client whose requests target `base_url` and carry
/// `access_token` as a bearer token.
///
/// Returns null if either argument is null or not UTF-8, or if an internal
/// panic occurs. The caller must free the returned pointer with
/// `hs_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hs_client_new(
    base_url: *const c_char,
    access_token: *const c_char,
) -> *mut FfiHubSpotClient {
    catch_unwind(|| {
        let (Ok(url), Ok(token)) = (read_str(base_url), read_str(access_token)) else {
            return std::ptr::null_mut();
        };
        let config = ClientConfig::new(token).base_url(url);
        Box::into_raw(Box::new(FfiHubSpotClient {
            inner: Associations::new(&config),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `hs_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hs_client_free(client: *mut FfiHubSpotClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

/// Default HUBSPOT_DEFINED association type id from `from_type` to
/// `to_type` (wire type names such as `contacts` or `files`).
///
/// Returns -1 for null or unknown type names and for pairs with no default.
#[unsafe(no_mangle)]
pub extern "C" fn hs_infer_association_type_id(
    from_type: *const c_char,
    to_type: *const c_char,
) -> i32 {
    catch_unwind(|| {
        let from = read_object_ref(from_type, c"".as_ptr()).ok()?;
        let to = read_object_ref(to_type, c"".as_ptr()).ok()?;
        let id = infer_association_type_id(from.identity, to.identity).ok()?;
        i32::try_from(id).ok()
    })
    .ok()
    .flatten()
    .unwrap_or(-1)
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the PUT that associates `from` to `to`.
///
/// `definer` may be null for HUBSPOT_DEFINED; it is matched
/// case-insensitively. A negative `association_type_id` asks for the id to
/// be inferred, which only HUBSPOT_DEFINED allows.
///
/// Returns null on failure. When `error_code` is non-null it receives `Ok`
/// or the reason for the failure.
/// The caller must free the returned pointer with `hs_free_request`.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn hs_build_create_association(
    client: *const FfiHubSpotClient,
    from_type: *const c_char,
    from_id: *const c_char,
    to_type: *const c_char,
    to_id: *const c_char,
    definer: *const c_char,
    association_type_id: i64,
    error_code: *mut FfiErrorCode,
) -> *mut FfiHttpRequest {
    let outcome = catch_unwind(|| -> Result<*mut FfiHttpRequest, FfiErrorCode> {
        let client = client_ref(client)?;
        let from = read_object_ref(from_type, from_id)?;
        let to = read_object_ref(to_type, to_id)?;
        let definer = if definer.is_null() {
            Definer::HubspotDefined.as_str()
        } else {
            read_str(definer)?
        };
        let type_id = match association_type_id {
            id if id < 0 => None,
            id => Some(u32::try_from(id).map_err(|_| FfiErrorCode::InvalidAssociationType)?),
        };
        client
            .inner
            .build_create_association(&from, &to, definer, type_id)
            .map(FfiHttpRequest::from_core)
            .map_err(|e| FfiErrorCode::from(&e))
    })
    .unwrap_or(Err(FfiErrorCode::Panic));
    finish_build(outcome, error_code)
}

/// Build the DELETE that removes every association from `from` to `to`.
///
/// Returns null on failure; `error_code` behaves as in
/// `hs_build_create_association`.
#[unsafe(no_mangle)]
pub extern "C" fn hs_build_remove_association(
    client: *const FfiHubSpotClient,
    from_type: *const c_char,
    from_id: *const c_char,
    to_type: *const c_char,
    to_id: *const c_char,
    error_code: *mut FfiErrorCode,
) -> *mut FfiHttpRequest {
    let outcome = catch_unwind(|| -> Result<*mut FfiHttpRequest, FfiErrorCode> {
        let client = client_ref(client)?;
        let from = read_object_ref(from_type, from_id)?;
        let to = read_object_ref(to_type, to_id)?;
        client
            .inner
            .build_remove_association(&from, &to)
            .map(FfiHttpRequest::from_core)
            .map_err(|e| FfiErrorCode::from(&e))
    })
    .unwrap_or(Err(FfiErrorCode::Panic));
    finish_build(outcome, error_code)
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is an
/// empty body.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }
            .to_string_lossy()
            .into_owned()
    };
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    }
}

/// Parse the response to an association PUT.
///
/// On success `data_tag = Json` and `data` holds the server's JSON body,
/// or `data_tag = None` when the body was empty.
#[unsafe(no_mangle)]
pub extern "C" fn hs_parse_create_association(
    client: *const FfiHubSpotClient,
    response: *const FfiHttpResponse,
) -> *mut FfiHsResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiHsResult::null_arg("client");
        }
        if response.is_null() {
            return FfiHsResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_create_association(ffi_response_to_core(resp)) {
            Ok(value) => FfiHsResult::ok_json(value),
            Err(e) => FfiHsResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiHsResult::panic("panic in hs_parse_create_association"))
}

/// Parse the response to an association DELETE.
///
/// Returns a result with `data_tag = None` on success.
#[unsafe(no_mangle)]
pub extern "C" fn hs_parse_remove_association(
    client: *const FfiHubSpotClient,
    response: *const FfiHttpResponse,
) -> *mut FfiHsResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiHsResult::null_arg("client");
        }
        if response.is_null() {
            return FfiHsResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_remove_association(ffi_response_to_core(resp)) {
            Ok(()) => FfiHsResult::ok_empty(),
            Err(e) => FfiHsResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiHsResult::panic("panic in hs_parse_remove_association"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `hs_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hs_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        hs_free_string(req.path);
        hs_free_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                hs_free_string(h.key);
                hs_free_string(h.value);
            }
        }
    });
}

/// Free an `FfiHsResult` returned by any `hs_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn hs_free_result(result: *mut FfiHsResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        hs_free_string(result.error_message);
        match result.data_tag {
            FfiDataTag::Json => hs_free_string(result.data.cast()),
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hs_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> *mut FfiHubSpotClient {
        hs_client_new(c"http://localhost:3000".as_ptr(), c"test-token".as_ptr())
    }

    fn c_str<'a>(ptr: *const c_char) -> &'a str {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap()
    }

    fn build_create(
        client: *const FfiHubSpotClient,
        from: (&CStr, &CStr),
        to: (&CStr, &CStr),
        definer: Option<&CStr>,
        type_id: i64,
    ) -> (*mut FfiHttpRequest, FfiErrorCode) {
        let mut code = FfiErrorCode::Panic;
        let req = hs_build_create_association(
            client,
            from.0.as_ptr(),
            from.1.as_ptr(),
            to.0.as_ptr(),
            to.1.as_ptr(),
            definer.map_or(std::ptr::null(), CStr::as_ptr),
            type_id,
            &mut code,
        );
        (req, code)
    }

    #[test]
    fn client_new_and_free() {
        let client = client();
        assert!(!client.is_null());
        hs_client_free(client);
    }

    #[test]
    fn client_new_null_returns_null() {
        assert!(hs_client_new(std::ptr::null(), c"t".as_ptr()).is_null());
        assert!(hs_client_new(c"http://x".as_ptr(), std::ptr::null()).is_null());
    }

    #[test]
    fn client_free_null_is_safe() {
        hs_client_free(std::ptr::null_mut());
    }

    #[test]
    fn infer_association_type_id_by_type_name() {
        assert_eq!(hs_infer_association_type_id(c"contacts".as_ptr(), c"companies".as_ptr()), 1);
        assert_eq!(hs_infer_association_type_id(c"companies".as_ptr(), c"contacts".as_ptr()), 2);
        assert_eq!(hs_infer_association_type_id(c"calls".as_ptr(), c"tickets".as_ptr()), 18);
        assert_eq!(hs_infer_association_type_id(c"files".as_ptr(), c"deals".as_ptr()), 12);
        assert_eq!(hs_infer_association_type_id(c"products".as_ptr(), c"deals".as_ptr()), -1);
        assert_eq!(hs_infer_association_type_id(c"widgets".as_ptr(), c"deals".as_ptr()), -1);
        assert_eq!(hs_infer_association_type_id(std::ptr::null(), c"deals".as_ptr()), -1);
    }

    #[test]
    fn build_create_association_inferred() {
        let client = client();
        let (req, code) = build_create(client, (c"contacts", c"101"), (c"companies", c"202"), None, -1);
        assert_eq!(code, FfiErrorCode::Ok);
        assert!(!req.is_null());

        let r = unsafe { &*req };
        assert_eq!(r.method, FfiHttpMethod::Put);
        assert_eq!(
            c_str(r.path),
            "http://localhost:3000/crm/v4/objects/contacts/101/associations/companies/202"
        );
        let body: serde_json::Value = serde_json::from_str(c_str(r.body)).unwrap();
        assert_eq!(
            body,
            serde_json::json!([{"associationCategory": "HUBSPOT_DEFINED", "associationTypeId": 1}])
        );

        assert_eq!(r.headers_len, 2);
        let headers = unsafe { std::slice::from_raw_parts(r.headers, r.headers_len as usize) };
        assert_eq!(c_str(headers[0].key), "authorization");
        assert_eq!(c_str(headers[0].value), "Bearer test-token");
        assert_eq!(c_str(headers[1].value), "application/json");

        hs_free_request(req);
        hs_client_free(client);
    }

    #[test]
    fn build_create_association_user_defined() {
        let client = client();
        let (req, code) = build_create(
            client,
            (c"deals", c"1"),
            (c"contacts", c"2"),
            Some(c"user_defined"),
            512,
        );
        assert_eq!(code, FfiErrorCode::Ok);
        let body: serde_json::Value = serde_json::from_str(c_str(unsafe { &*req }.body)).unwrap();
        assert_eq!(body[0]["associationCategory"], "USER_DEFINED");
        assert_eq!(body[0]["associationTypeId"], 512);

        hs_free_request(req);
        hs_client_free(client);
    }

    #[test]
    fn build_create_association_reports_validation_errors() {
        let client = client();
        let cases = [
            (Some(c"nobody_defined"), -1, FfiErrorCode::InvalidDefiner),
            (None, 22, FfiErrorCode::InvalidAssociationType),
            (None, 0, FfiErrorCode::InvalidAssociationType),
            (None, i64::from(u32::MAX) + 1, FfiErrorCode::InvalidAssociationType),
            (Some(c"INTEGRATOR_DEFINED"), -1, FfiErrorCode::MissingAssociationType),
        ];
        for (definer, type_id, expected) in cases {
            let (req, code) = build_create(client, (c"contacts", c"1"), (c"companies", c"2"), definer, type_id);
            assert!(req.is_null());
            assert_eq!(code, expected);
        }

        let (req, code) = build_create(client, (c"products", c"1"), (c"contacts", c"2"), None, -1);
        assert!(req.is_null());
        assert_eq!(code, FfiErrorCode::NoMatrixEntry);

        let (req, code) = build_create(client, (c"widgets", c"1"), (c"contacts", c"2"), None, -1);
        assert!(req.is_null());
        assert_eq!(code, FfiErrorCode::UnknownType);

        hs_client_free(client);
    }

    #[test]
    fn build_rejects_record_ids_that_are_not_numeric() {
        let client = client();
        let (req, code) = build_create(
            client,
            (c"contacts", c"1/associations/deals/9?x="),
            (c"companies", c"2"),
            None,
            -1,
        );
        assert!(req.is_null());
        assert_eq!(code, FfiErrorCode::InvalidRecordId);

        let mut code = FfiErrorCode::Ok;
        let req = hs_build_remove_association(
            client,
            c"contacts".as_ptr(),
            c"".as_ptr(),
            c"companies".as_ptr(),
            c"2".as_ptr(),
            &mut code,
        );
        assert!(req.is_null());
        assert_eq!(code, FfiErrorCode::InvalidRecordId);

        hs_client_free(client);
    }

    #[test]
    fn build_create_association_null_args() {
        let (req, code) = build_create(std::ptr::null(), (c"contacts", c"1"), (c"companies", c"2"), None, -1);
        assert!(req.is_null());
        assert_eq!(code, FfiErrorCode::NullArg);

        let client = client();
        let mut code = FfiErrorCode::Ok;
        let req = hs_build_create_association(
            client,
            c"contacts".as_ptr(),
            std::ptr::null(),
            c"companies".as_ptr(),
            c"2".as_ptr(),
            std::ptr::null(),
            -1,
            &mut code,
        );
        assert!(req.is_null());
        assert_eq!(code, FfiErrorCode::NullArg);

        // The out-parameter is optional.
        let req = hs_build_create_association(
            client,
            c"contacts".as_ptr(),
            c"1".as_ptr(),
            c"companies".as_ptr(),
            c"2".as_ptr(),
            std::ptr::null(),
            -1,
            std::ptr::null_mut(),
        );
        assert!(!req.is_null());
        hs_free_request(req);
        hs_client_free(client);
    }

    #[test]
    fn build_remove_association_is_delete_without_body() {
        let client = client();
        let mut code = FfiErrorCode::Panic;
        let req = hs_build_remove_association(
            client,
            c"files".as_ptr(),
            c"5".as_ptr(),
            c"notes".as_ptr(),
            c"6".as_ptr(),
            &mut code,
        );
        assert_eq!(code, FfiErrorCode::Ok);
        let r = unsafe { &*req };
        assert_eq!(r.method, FfiHttpMethod::Delete);
        assert_eq!(
            c_str(r.path),
            "http://localhost:3000/crm/v4/objects/files/5/associations/notes/6"
        );
        assert!(r.body.is_null());
        assert_eq!(r.headers_len, 1);

        hs_free_request(req);
        hs_client_free(client);
    }

    #[test]
    fn parse_create_association_success() {
        let client = client();
        let body = c"{\"fromObjectId\":101,\"toObjectId\":202,\"labels\":[]}";
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = hs_parse_create_association(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::Json);
        let json: serde_json::Value = serde_json::from_str(c_str(r.data as *const c_char)).unwrap();
        assert_eq!(json["toObjectId"], 202);

        hs_free_result(result);
        hs_client_free(client);
    }

    #[test]
    fn parse_create_association_empty_body() {
        let client = client();
        let resp = FfiHttpResponse {
            status: 204,
            body: std::ptr::null(),
        };
        let result = hs_parse_create_association(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::None);
        assert!(r.data.is_null());

        hs_free_result(result);
        hs_client_free(client);
    }

    #[test]
    fn parse_remove_association_success() {
        let client = client();
        let resp = FfiHttpResponse {
            status: 204,
            body: c"".as_ptr(),
        };
        let result = hs_parse_remove_association(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());

        hs_free_result(result);
        hs_client_free(client);
    }

    #[test]
    fn parse_remove_association_not_found() {
        let client = client();
        let resp = FfiHttpResponse {
            status: 404,
            body: c"{\"message\":\"not found\"}".as_ptr(),
        };
        let result = hs_parse_remove_association(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Http);
        assert_eq!(r.http_status, 404);
        assert!(c_str(r.error_message).contains("404"));

        hs_free_result(result);
        hs_client_free(client);
    }

    #[test]
    fn parse_create_association_garbage_body() {
        let client = client();
        let resp = FfiHttpResponse {
            status: 200,
            body: c"<html>".as_ptr(),
        };
        let result = hs_parse_create_association(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Deserialization);
        assert_eq!(r.http_status, 0);

        hs_free_result(result);
        hs_client_free(client);
    }

    #[test]
    fn parse_null_client_returns_null_arg() {
        let resp = FfiHttpResponse {
            status: 204,
            body: std::ptr::null(),
        };
        let result = hs_parse_remove_association(std::ptr::null(), &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);

        hs_free_result(result);
    }

    #[test]
    fn parse_null_response_returns_null_arg() {
        let client = client();
        let result = hs_parse_create_association(client, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);

        hs_free_result(result);
        hs_client_free(client);
    }

    #[test]
    fn c_string_drops_interior_nul() {
        let s = c_string("a\0b");
        assert_eq!(c_str(s), "ab");
        hs_free_string(s);
    }

    #[test]
    fn free_request_null_is_safe() {
        hs_free_request(std::ptr::null_mut());
    }

    #[test]
    fn free_result_null_is_safe() {
        hs_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        hs_free_string(std::ptr::null_mut());
    }
}
