/*!
# Galaxy 3D RHI

Deferred command submission and descriptor set caching for the Galaxy 3D
rendering engine.

Application threads never talk to the graphics API directly. They record
rendering operations into a `CommandList`; each operation is captured as a
closure over the execution `Context` and committed to the
`CommandListManager`. Once per frame the manager hands the committed buffers
to a single execution thread, which replays them against the context.

## Architecture

- **CommandBuffer**: fixed-capacity buffer of recorded closures, recycled
- **CommandList**: per-thread recorder enforcing the scene / render pass protocol
- **CommandListManager**: buffer pool plus the submit / execute queue pair
- **DescriptorSetCache**: per-layout descriptor pools, partitioned per
  frame-in-flight, growing geometrically and garbage collected by age
- **Context** / resource traits: the contract implemented by a backend
  (see `galaxy_3d_rhi_vulkan`)

## Frame loop

```text
recording threads            coordinating thread         execution thread
-----------------            -------------------         ----------------
list.begin_scene(..)         manager.begin_frame()
  ...                          ...
list.end_scene()
list.flush()                 manager.end_frame()  ---->  manager.execute_pending()
```
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod rhi;
pub mod command;
pub mod descriptor;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging facade
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::Config;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Backend contracts: context, resources, pipeline state, program metadata
    pub mod rhi {
        pub use crate::rhi::*;
    }

    // Command recording and submission
    pub mod cmd {
        pub use crate::command::*;
    }

    // Descriptor set cache and backend trait
    pub mod descriptor {
        pub use crate::descriptor::*;
    }
}

// Re-export math and payload crates used in the public API
pub use glam;
pub use bytes;
