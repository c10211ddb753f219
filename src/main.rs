use bokeh::{
    Animator, AppConfig, Camera, DofUpdate, Mesh, Node, RenderContext, Scene, Transform, Vec3,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    bokeh::run(AppConfig::new().title("Bokeh").size(1280, 720), |gpu| {
        let camera = Camera::perspective(50.0, gpu.aspect(), 0.1, 15.0)?
            .at(Vec3::new(0.0, 0.0, 10.0))
            .looking_at(Vec3::ZERO);

        let mut scene = Scene::new();
        scene.add(Node {
            mesh: Mesh::plane(gpu, 4.0),
            transform: Transform::from_position(Vec3::new(0.0, 0.0, -4.0)),
            color: [0.17, 0.17, 0.18, 1.0],
        });
        scene.add(Node {
            mesh: Mesh::plane(gpu, 1.0),
            transform: Transform::from_position(Vec3::new(0.0, 0.0, 2.0)),
            color: [0.6, 0.6, 0.6, 1.0],
        });
        scene.add(Node {
            mesh: Mesh::cube(gpu),
            transform: Transform::from_position(Vec3::new(-1.8, 0.8, -1.0)),
            color: [0.45, 0.5, 0.62, 1.0],
        });
        scene.light.color = [0.956, 0.949, 0.894];
        scene.light.position = Vec3::new(0.0, -3.0, 7.0);

        let mut context = RenderContext::new(gpu, scene, camera, Animator::default())?;
        // Focus on the foreground plane at z = 2, eight units from the
        // camera; the backdrop falls out of focus.
        context.set_depth_of_field(DofUpdate {
            focal_depth: Some(8.0),
            aperture: Some(2.2),
            max_blur: Some(1.3),
            ..Default::default()
        })?;
        Ok(context)
    })
}
