//! Sweeps the focal plane back and forth through the scene, so each object
//! drifts in and out of focus in turn.

use bokeh::{
    Animator, AppConfig, Camera, Mesh, Node, RenderContext, Scene, Transform, Vec3, WaveTrack,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    bokeh::run(
        AppConfig::new().title("Focus Sweep").size(1280, 720),
        |gpu| {
            let camera = Camera::perspective(50.0, gpu.aspect(), 0.1, 15.0)?
                .at(Vec3::new(0.0, 0.0, 10.0))
                .looking_at(Vec3::ZERO);

            let mut scene = Scene::new();
            scene.add(Node {
                mesh: Mesh::plane(gpu, 4.0),
                transform: Transform::from_position(Vec3::new(0.0, 0.0, -4.0)),
                color: [0.17, 0.17, 0.18, 1.0],
            });
            for (i, z) in [-2.0f32, 0.0, 2.0].into_iter().enumerate() {
                scene.add(Node {
                    mesh: Mesh::cube(gpu),
                    transform: Transform::from_position(Vec3::new(i as f32 * 1.6 - 1.6, 0.0, z)),
                    color: [0.55, 0.45 + 0.1 * i as f32, 0.62, 1.0],
                });
            }
            scene.light.color = [0.956, 0.949, 0.894];

            // Sweep the focal plane from just in front of the nearest cube
            // out to the backdrop, in world units from the camera.
            let animator =
                Animator::default().with_focus_sweep(WaveTrack::new(6.0, 14.0, 0.5));
            RenderContext::new(gpu, scene, camera, animator)
        },
    )
}
