// CONTROLLER: Input, simulation, and update loop
pub mod camera_controller;
pub mod frame_loop;
pub mod input;
pub mod physics;
pub mod sync;
pub mod viewport;

pub use camera_controller::OrbitControls;
pub use frame_loop::{FrameLoop, LoopState, TickReport};
pub use input::{InputController, InputEvent, KeyBinding, MouseButton};
pub use physics::{BodyDesc, BodyHandle, BodyShape, PhysicsStepper, PhysicsWorld};
pub use viewport::{ResizeOutcome, ViewportManager};
