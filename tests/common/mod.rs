//! In-memory container runtime that records every call

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use neurolaunch::runtime::{ContainerInfo, ContainerRuntime, ContainerState, RunSpec, RuntimeError};

pub const CONTAINER_ID: &str = "c0ffee1234567890abcdef";

/// Mutable world the fake runtime simulates
#[derive(Debug, Clone)]
pub struct World {
    pub installed: bool,
    pub accel_supported: bool,
    pub exists: bool,
    pub running: bool,
    /// Image identity of the existing container
    pub container_image: String,
    /// Identity after a pull; None makes pulls fail
    pub latest_image: Option<String>,
    /// Pull succeeds but inspecting the pulled image fails
    pub image_inspect_fails: bool,
    pub run_fails: bool,
    pub start_fails: bool,
    /// Names as the listing prints them (e.g., "llama3.2:3b")
    pub models: Vec<String>,
    pub failing_fetches: HashSet<String>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            installed: true,
            accel_supported: false,
            exists: false,
            running: false,
            container_image: "sha256:current".to_string(),
            latest_image: Some("sha256:current".to_string()),
            image_inspect_fails: false,
            run_fails: false,
            start_fails: false,
            models: Vec::new(),
            failing_fetches: HashSet::new(),
        }
    }
}

pub struct FakeRuntime {
    world: Mutex<World>,
    calls: Mutex<Vec<String>>,
    runs: Mutex<Vec<RunSpec>>,
    /// Exec commands whose output went straight to the terminal
    streamed: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn new(world: World) -> Self {
        Self {
            world: Mutex::new(world),
            calls: Mutex::new(Vec::new()),
            runs: Mutex::new(Vec::new()),
            streamed: Mutex::new(Vec::new()),
        }
    }

    /// Container running on the current image with the given models
    pub fn running_with(models: &[&str]) -> Self {
        Self::new(World {
            exists: true,
            running: true,
            models: models.iter().map(|m| m.to_string()).collect(),
            ..World::default()
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Calls whose name starts with `prefix`
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn runs(&self) -> Vec<RunSpec> {
        self.runs.lock().unwrap().clone()
    }

    pub fn streamed(&self) -> Vec<String> {
        self.streamed.lock().unwrap().clone()
    }

    pub fn world(&self) -> World {
        self.world.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

fn fail(command: &str, detail: &str) -> RuntimeError {
    RuntimeError::new(format!("docker {}", command), detail)
}

impl ContainerRuntime for FakeRuntime {
    fn is_installed(&self) -> bool {
        self.world.lock().unwrap().installed
    }

    fn supports_acceleration(&self) -> bool {
        self.record("info");
        self.world.lock().unwrap().accel_supported
    }

    fn exists(&self, name: &str) -> Result<bool, RuntimeError> {
        self.record(format!("exists {}", name));
        Ok(self.world.lock().unwrap().exists)
    }

    fn inspect(&self, name: &str) -> Result<ContainerInfo, RuntimeError> {
        self.record(format!("inspect {}", name));
        let world = self.world.lock().unwrap();
        if !world.exists {
            return Err(fail("container inspect", "no such container"));
        }
        Ok(ContainerInfo {
            id: CONTAINER_ID.to_string(),
            image: world.container_image.clone(),
            state: ContainerState {
                running: world.running,
            },
        })
    }

    fn pull(&self, image: &str) -> Result<(), RuntimeError> {
        self.record(format!("pull {}", image));
        match self.world.lock().unwrap().latest_image {
            Some(_) => Ok(()),
            None => Err(fail("pull", "network unreachable")),
        }
    }

    fn image_id(&self, image: &str) -> Result<String, RuntimeError> {
        self.record(format!("image_id {}", image));
        let world = self.world.lock().unwrap();
        if world.image_inspect_fails {
            return Err(fail("image inspect", "unexpected end of JSON input"));
        }
        world
            .latest_image
            .clone()
            .ok_or_else(|| fail("image inspect", "no such image"))
    }

    fn run(&self, spec: &RunSpec) -> Result<String, RuntimeError> {
        self.record(format!("run {}", spec.name));
        self.runs.lock().unwrap().push(spec.clone());
        let mut world = self.world.lock().unwrap();
        if world.run_fails {
            return Err(fail("run", "port is already allocated"));
        }
        if world.exists {
            return Err(fail("run", "container name already in use"));
        }
        world.exists = true;
        world.running = true;
        world.container_image = world
            .latest_image
            .clone()
            .unwrap_or_else(|| "sha256:current".to_string());
        Ok(CONTAINER_ID.to_string())
    }

    fn start(&self, name: &str) -> Result<(), RuntimeError> {
        self.record(format!("start {}", name));
        let mut world = self.world.lock().unwrap();
        if world.start_fails {
            return Err(fail("start", "cannot start container"));
        }
        world.running = true;
        Ok(())
    }

    fn stop(&self, name: &str) -> Result<(), RuntimeError> {
        self.record(format!("stop {}", name));
        self.world.lock().unwrap().running = false;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), RuntimeError> {
        self.record(format!("remove {}", name));
        let mut world = self.world.lock().unwrap();
        world.exists = false;
        world.running = false;
        Ok(())
    }

    fn exec(&self, name: &str, command: &[&str]) -> Result<String, RuntimeError> {
        self.record(format!("exec {} {}", name, command.join(" ")));
        let mut world = self.world.lock().unwrap();
        if !world.running {
            return Err(fail("exec", "container is not running"));
        }

        match command {
            ["ollama", "list"] => {
                let mut listing = String::from("NAME                       ID              SIZE      MODIFIED\n");
                for model in &world.models {
                    listing.push_str(&format!("{:<26} 0a109f422b47    274 MB    2 days ago\n", model));
                }
                Ok(listing)
            }
            ["ollama", "pull", model] => {
                if world.failing_fetches.contains(*model) {
                    return Err(fail("exec", "pull model manifest: file does not exist"));
                }
                world.models.push(model.to_string());
                Ok(String::new())
            }
            _ => Err(fail("exec", "unknown command")),
        }
    }

    fn exec_streaming(&self, name: &str, command: &[&str]) -> Result<(), RuntimeError> {
        self.streamed.lock().unwrap().push(command.join(" "));
        self.exec(name, command).map(|_| ())
    }
}
