mod ha_control_light;
mod ha_control_switch;
mod ha_get_state;
mod ntp_tool;
mod ping_tool;

pub use ha_control_light::HaControlLight;
pub use ha_control_switch::HaControlSwitch;
pub use ha_get_state::HaGetDeviceState;
pub use ntp_tool::NtpTool;
pub use ping_tool::PingTool;
