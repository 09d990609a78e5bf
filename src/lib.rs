// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the interactive client.
//
// Module responsibilities:
// - `validate`: pure validation rules shared by the domain types.
// - `domain`: immutable, validated value types (credentials, link
//   fields) plus the link draft/record shapes.
// - `menu`: the keyed menu builder and its run loop.
// - `console`: the console I/O boundary, including a scripted console
//   for tests.
// - `api`: the backend trait and the blocking HTTP client that talks
//   to the URL-shortening service.
// - `ui`: the interactive workflows, one per user-facing operation.
//
// Keeping this separation makes it easy to test the workflows against
// a fake backend and a scripted console, or to replace the front end.
pub mod api;
pub mod console;
pub mod domain;
pub mod menu;
pub mod ui;
pub mod validate;
