//! wgpu rendering substrate: device and surface, depth target, camera rig,
//! composable shader programs, textures, lights, and sphere meshes.

pub mod camera;
pub mod depth;
pub mod gpu;
pub mod light;
pub mod mesh;
pub mod shader;
pub mod texture;

pub use camera::{Camera, CameraUniform, OrbitCamera};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use light::{DirectionalLight, DirectionalLightUniform};
pub use mesh::{GpuMesh, SphereMesh, SphereVertex, generate_uv_sphere};
pub use shader::{InsertionPoint, ShaderError, ShaderFragment, ShaderGraph, create_shader_module};
pub use texture::{AddressMode, GpuTexture, TextureData, TextureError, TextureOptions};
