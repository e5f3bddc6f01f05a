// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the data layer to accomplish one user-facing
// goal: validating a manifest, or loading a dataset variant
// and showing what a given index resolves to.
//
// Rules for this layer:
//   - No parsing or audio decoding here (that's Layer 4)
//   - No printing of CLI help or argument handling (Layer 1)
//   - Only workflow coordination and human-readable summaries
//
// Think of this layer as the "director" — it tells the data
// layer what to load but doesn't do the loading itself.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Manifest validation and per-index dataset inspection
pub mod inspect_use_case;
