//! Human-readable HRESULT descriptions.

/// `FACILITY_WIN32`: the low word is a plain Win32 error code.
const FACILITY_WIN32: u32 = 7;

/// `FACILITY_WINDOWS`.
const FACILITY_WINDOWS: u32 = 8;

pub const MF_E_PLATFORM_NOT_INITIALIZED: u32 = 0xC00D_36B0;
pub const MF_E_BUFFERTOOSMALL: u32 = 0xC00D_36B1;
pub const MF_E_INVALIDREQUEST: u32 = 0xC00D_36B2;
pub const MF_E_INVALIDSTREAMNUMBER: u32 = 0xC00D_36B3;
pub const MF_E_INVALIDMEDIATYPE: u32 = 0xC00D_36B4;
pub const MF_E_NOTACCEPTING: u32 = 0xC00D_36B5;
pub const MF_E_NOT_INITIALIZED: u32 = 0xC00D_36B6;
pub const MF_E_UNSUPPORTED_REPRESENTATION: u32 = 0xC00D_36B7;
pub const MF_E_NO_MORE_TYPES: u32 = 0xC00D_36B9;
pub const MF_E_UNSUPPORTED_SERVICE: u32 = 0xC00D_36BA;
pub const MF_E_UNEXPECTED: u32 = 0xC00D_36BB;
pub const MF_E_INVALIDTYPE: u32 = 0xC00D_36BD;
pub const MF_E_ATTRIBUTENOTFOUND: u32 = 0xC00D_36E6;
pub const MF_E_SHUTDOWN: u32 = 0xC00D_3E85;
pub const MF_E_TOPO_CODEC_NOT_FOUND: u32 = 0xC00D_5212;

/// A Media Foundation status code with a fixed explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownError {
    pub code: u32,
    pub name: &'static str,
    pub text: &'static str,
}

const KNOWN: &[KnownError] = &[
    KnownError {
        code: MF_E_PLATFORM_NOT_INITIALIZED,
        name: "MF_E_PLATFORM_NOT_INITIALIZED",
        text: "Media Foundation has not been started",
    },
    KnownError {
        code: MF_E_BUFFERTOOSMALL,
        name: "MF_E_BUFFERTOOSMALL",
        text: "The buffer was too small to carry out the requested action",
    },
    KnownError {
        code: MF_E_INVALIDREQUEST,
        name: "MF_E_INVALIDREQUEST",
        text: "The request is invalid in the current state",
    },
    KnownError {
        code: MF_E_INVALIDSTREAMNUMBER,
        name: "MF_E_INVALIDSTREAMNUMBER",
        text: "The stream number provided was invalid",
    },
    KnownError {
        code: MF_E_INVALIDMEDIATYPE,
        name: "MF_E_INVALIDMEDIATYPE",
        text: "The data specified for the media type is invalid, inconsistent, or not supported by this object",
    },
    KnownError {
        code: MF_E_NOTACCEPTING,
        name: "MF_E_NOTACCEPTING",
        text: "The callee is currently not accepting further input",
    },
    KnownError {
        code: MF_E_NOT_INITIALIZED,
        name: "MF_E_NOT_INITIALIZED",
        text: "This object needs to be initialized before the requested operation can be carried out",
    },
    KnownError {
        code: MF_E_UNSUPPORTED_REPRESENTATION,
        name: "MF_E_UNSUPPORTED_REPRESENTATION",
        text: "The requested representation is not supported by this object",
    },
    KnownError {
        code: MF_E_NO_MORE_TYPES,
        name: "MF_E_NO_MORE_TYPES",
        text: "An object ran out of media types to suggest",
    },
    KnownError {
        code: MF_E_UNSUPPORTED_SERVICE,
        name: "MF_E_UNSUPPORTED_SERVICE",
        text: "The object does not support the specified service",
    },
    KnownError {
        code: MF_E_UNEXPECTED,
        name: "MF_E_UNEXPECTED",
        text: "An unexpected error has occurred in the operation requested",
    },
    KnownError {
        code: MF_E_INVALIDTYPE,
        name: "MF_E_INVALIDTYPE",
        text: "The requested attribute is not of the requested type",
    },
    KnownError {
        code: MF_E_ATTRIBUTENOTFOUND,
        name: "MF_E_ATTRIBUTENOTFOUND",
        text: "The requested attribute was not found",
    },
    KnownError {
        code: MF_E_SHUTDOWN,
        name: "MF_E_SHUTDOWN",
        text: "The object has been shut down",
    },
    KnownError {
        code: MF_E_TOPO_CODEC_NOT_FOUND,
        name: "MF_E_TOPO_CODEC_NOT_FOUND",
        text: "No suitable transform was found to encode or decode the content",
    },
];

/// Look up a Media Foundation status code.
pub fn known_error(code: u32) -> Option<&'static KnownError> {
    KNOWN.iter().find(|known| known.code == code)
}

/// Message id to hand to the system message table.
///
/// Win32 facility codes carry the real error in their low word.
pub fn message_id(code: u32) -> u32 {
    let facility = (code >> 16) & 0x1fff;
    if facility == FACILITY_WINDOWS || facility == FACILITY_WIN32 {
        code & 0xffff
    } else {
        code
    }
}

/// Fallback text when nothing better is available.
pub fn no_information(code: u32) -> String {
    format!("[No further information for HRESULT 0x{code:08X}]")
}

/// Describe `code`, preferring the fixed Media Foundation table, then the
/// system message, then a fallback.
pub fn describe_with(code: u32, system_message: Option<&str>) -> String {
    if let Some(known) = known_error(code) {
        return format!("{} 0x{:08X}: {}", known.name, known.code, known.text);
    }
    match system_message.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => no_information(code),
    }
}

/// Describe `code` using the system message table.
#[cfg(windows)]
pub fn describe_hresult(code: u32) -> String {
    use windows::core::HRESULT;

    let system = HRESULT(code as i32).message().to_string();
    if system.trim().is_empty() && message_id(code) != code {
        let win32 = HRESULT::from_win32(message_id(code)).message().to_string();
        return describe_with(code, Some(&win32));
    }
    describe_with(code, Some(&system))
}

/// Describe `code`; no system message table is available here.
#[cfg(not(windows))]
pub fn describe_hresult(code: u32) -> String {
    describe_with(code, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_not_found_is_explained() {
        let text = describe_with(MF_E_TOPO_CODEC_NOT_FOUND, Some("ignored"));
        assert_eq!(
            text,
            "MF_E_TOPO_CODEC_NOT_FOUND 0xC00D5212: No suitable transform was found to encode or decode the content"
        );
    }

    #[test]
    fn test_system_message_used_for_unknown_codes() {
        assert_eq!(
            describe_with(0x8007_0005, Some("Access is denied.\r\n")),
            "Access is denied."
        );
    }

    #[test]
    fn test_fallback_when_no_message() {
        assert_eq!(
            describe_with(0x8000_4005, Some("  ")),
            "[No further information for HRESULT 0x80004005]"
        );
        assert_eq!(describe_with(0x1234, None), no_information(0x1234));
    }

    #[test]
    fn test_message_id_strips_win32_facility() {
        assert_eq!(message_id(0x8007_0002), 2);
        assert_eq!(message_id(0x8008_0010), 0x10);
        assert_eq!(message_id(MF_E_NO_MORE_TYPES), MF_E_NO_MORE_TYPES);
    }

    #[test]
    fn test_stream_enumeration_codes_are_known() {
        assert_eq!(
            known_error(MF_E_INVALIDSTREAMNUMBER).map(|k| k.name),
            Some("MF_E_INVALIDSTREAMNUMBER")
        );
        assert_eq!(
            known_error(MF_E_NO_MORE_TYPES).map(|k| k.name),
            Some("MF_E_NO_MORE_TYPES")
        );
        assert!(known_error(0x8000_4005).is_none());
    }
}
