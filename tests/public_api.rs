#![allow(unused_imports)]

use mail_tui::{
    strip_ansi, truncate_to_width, visible_width, wrap_text, Command, Component, CustomCommand,
    CustomCommandCtx, CustomCommandError, Input, InputEvent, Loader, ProcessTerminal,
    RenderHandle, RuntimeHandle, Terminal, TUI,
};

#[test]
fn public_api_exports_compile() {}
