//! Shared UI icons.

use console::Emoji;

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">");
pub static NEWS: Emoji<'_, '_> = Emoji("📰 ", "*");
pub static USER: Emoji<'_, '_> = Emoji("👤 ", "-");
pub static ONLINE: Emoji<'_, '_> = Emoji("🟢 ", "[UP]");
pub static OFFLINE: Emoji<'_, '_> = Emoji("🔴 ", "[DOWN]");
pub static UNKNOWN: Emoji<'_, '_> = Emoji("⚪ ", "[?]");
