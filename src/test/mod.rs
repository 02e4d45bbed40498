mod reader;
mod session_log;
mod support;
