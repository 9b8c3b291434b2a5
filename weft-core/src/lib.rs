//! Weft Core
//!
//! This crate provides the reactive core of the Weft view layer.
//! It implements:
//!
//! - Reactive primitives (signals, memos, effects)
//! - The ownership tree that scopes computations and their cleanups
//! - Render effects that keep host nodes in sync by replacing them in place
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `reactive`: signals, owners, effects, memos and dependency tracking
//! - `render`: the host capability trait, the node materializer, render
//!   effects, and an in-memory host
//!
//! Everything is single-threaded and synchronous. A signal write re-runs its
//! dependents to completion before it returns.
//!
//! # Example
//!
//! ```rust
//! use weft_core::reactive::{create_effect, create_memo, create_root, create_signal};
//! use weft_core::render::{element, render, Host, MemoryDocument};
//!
//! // Create a signal
//! let (count, set_count) = create_signal(0);
//!
//! create_root(|_| {
//!     // Create a derived value
//!     let source = count.clone();
//!     let doubled = create_memo(move |_| source.get() * 2);
//!
//!     // Create an effect
//!     let count = count.clone();
//!     create_effect(move || {
//!         println!("Count: {}, Doubled: {}", count.get(), doubled.get());
//!     });
//! });
//!
//! // Render into an in-memory document
//! let doc = MemoryDocument::new();
//! let app = doc.create_element("main");
//! let _dispose = render(&doc, &app, move || {
//!     element::<MemoryDocument>("span").child(count.get())
//! });
//!
//! // Update the signal
//! set_count.set(5);
//! // Effect automatically runs, prints: "Count: 5, Doubled: 10"
//! assert_eq!(doc.to_html(app), "<main><span>5</span></main>");
//! ```

pub mod reactive;
pub mod render;
