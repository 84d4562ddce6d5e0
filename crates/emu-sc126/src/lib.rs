//! SC126/SC131 single-board computer emulation.
//!
//! The board wires a Z180 (CPU, MMU, ASCI, PRT) to 512 KiB of ROM and
//! 512 KiB of battery-backed RAM and presents a byte-serial console to
//! the host. Enough of the hardware is modeled to boot RomWBW and run
//! its CP/M environment; video, keyboard capture and the terminal are
//! host collaborators on the other side of the console byte stream.

mod board;
mod bus;
mod config;
pub mod console;
pub mod mcp;
pub mod snapshot;
pub mod xmodem;

pub use board::{INPUT_INTERVAL, STEPS_PER_BURST, Sc126};
pub use bus::Sc126Bus;
pub use config::{Sc126Config, Sc126Model};
pub use mcp::McpServer;
pub use xmodem::XmodemSender;
