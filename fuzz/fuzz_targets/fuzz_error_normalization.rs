#![no_main]

use libfuzzer_sys::fuzz_target;

use deskadmin::gateway::{DuplicateKey, GatewayError};

fuzz_target!(|data: &str| {
    // Backend error bodies are untrusted: whatever arrives must turn into a
    // message without panicking, and the duplicate-entry regex must not hang.
    let _ = DuplicateKey::parse(data);

    for status in [400u16, 404, 409, 500, 503] {
        let err = GatewayError::from_response(status, data);
        let _ = err.user_message();
        let _ = err.field();
        assert_eq!(err.status(), Some(status));
    }
});
