// Registration manifest.
//
// The TV checks the signed block against its own copy; the values below
// are the well-known test manifest every third-party remote ships.

use serde_json::{Value, json};

pub const MANIFEST_VERSION: u32 = 1;
pub const APP_ID: &str = "com.lge.test";
pub const VENDOR_ID: &str = "com.lge";

/// Permissions requested from the TV. The same list appears in the
/// signed block and at the top level of the manifest.
pub const PERMISSIONS: &[&str] = &[
    "LAUNCH",
    "LAUNCH_WEBAPP",
    "APP_TO_APP",
    "CLOSE",
    "TEST_OPEN",
    "TEST_PROTECTED",
    "CONTROL_AUDIO",
    "CONTROL_DISPLAY",
    "CONTROL_INPUT_JOYSTICK",
    "CONTROL_INPUT_MEDIA_RECORDING",
    "CONTROL_INPUT_MEDIA_PLAYBACK",
    "CONTROL_INPUT_TV",
    "CONTROL_POWER",
    "READ_APP_STATUS",
    "READ_CURRENT_CHANNEL",
    "READ_INPUT_DEVICE_LIST",
    "READ_NETWORK_STATE",
    "READ_RUNNING_APPS",
    "READ_TV_CHANNEL_LIST",
    "WRITE_NOTIFICATION_TOAST",
    "READ_POWER_STATE",
    "READ_COUNTRY_INFO",
    "CONTROL_MOUSE_AND_KEYBOARD",
    "CONTROL_INPUT_TEXT",
];

const SIGNATURE: &str = "eyJhbGdvcml0aG0iOiJSU0EtU0hBMjU2Iiwia2V5SWQiOiJ0ZXN0LXNpZ25pbmctY2VydCIsInNpZ25hdHVyZVZlcnNpb24iOjF9.hrVRgjCwXVvE2OOSpDZ58hR+59aFNwYDyjQgKk3auukd7pcegmE2CzPCa0bJ0ZsRAcKkCTJrWo5iDzNhMBWRyaMOv5zWSrthlf7G128qvIlpMT0YNY+n/FaOHE73uLrS/g7swl3/qH/BGFG2Hu4RlL48eb3lLKqTt2xKHdCs6Cd4RMfJPYnzgvI4BNrFUKsjkcu+WD4OO2A27Pq1n50cMchmcaXadJhGrOqH5YmHdOCj5NSHzJYrsW0HPlpuAx/ECMeIZYDh6RMqaFM2DXzdKX9NmmyqzJ3o/0lkk/N97gfVRLW5hA29yeAwaCViZNCP8iC9aO0q9fQojoa7NQnAtw==";

/// Build the manifest JSON sent inside every `register` frame.
pub fn manifest() -> Value {
    json!({
        "manifestVersion": MANIFEST_VERSION,
        "appVersion": "1.1",
        "signed": {
            "created": "20140509",
            "appId": APP_ID,
            "vendorId": VENDOR_ID,
            "localizedAppNames": { "": "LG Remote" },
            "localizedVendorNames": { "": "LG Electronics" },
            "permissions": PERMISSIONS,
            "serial": "2f930e2d2cfe083771f68e4fe7bb07",
        },
        "permissions": PERMISSIONS,
        "signatures": [{
            "signatureVersion": 1,
            "signature": SIGNATURE,
        }],
    })
}
