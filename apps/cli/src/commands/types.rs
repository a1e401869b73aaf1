//! Command type definitions shared between main.rs and tests.

use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum ModelsCommand {
    /// List installed models as reported by the server
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a model is resident in memory
    Check {
        /// Model name (e.g., llama3.2:1b)
        name: String,
    },

    /// Load a model into memory ahead of use
    Load {
        /// Model name (e.g., llama3.2:1b)
        name: String,
    },

    /// Forget the cached status of a model
    ///
    /// Ollama has no unload request; it evicts idle models on its own. This
    /// only clears Hearth's cached status.
    Unload {
        /// Model name (e.g., llama3.2:1b)
        name: String,
    },
}
