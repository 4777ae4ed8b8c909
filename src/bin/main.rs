use airfoil2d_rs::assemble::{assemble, mesh_file_name, Hole};
use airfoil2d_rs::boundary_layer::BoundaryLayerSpec;
use airfoil2d_rs::config::Config;
use airfoil2d_rs::domain::Domain;
use airfoil2d_rs::errors::Result;
use airfoil2d_rs::geometry::contour::Contour;
use airfoil2d_rs::profile::{Naca4Digit, ProfileGenerator};
use airfoil2d_rs::session::{KernelSession, RecordingSession};
use ncollide2d::na::Point2;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

// Builds a NACA 0012 at 5 degrees of incidence inside a circular far field
// with a boundary layer, against the in-memory recording session.
fn run() -> Result<()> {
    let config = Config::parse(
        "naca= 0012\n\
         aoa= 5.0\n\
         farfield= 10\n",
    )?;

    let airfoil = Naca4Digit::from_code("0012")?
        .generate(200)?
        .rotated(-config.aoa().to_radians(), &Point2::new(0.5, 0.0));

    let skin = Contour::from_points(airfoil.points(), config.airfoil_mesh_size(), 1e-9)?;
    log::info!("airfoil perimeter: {:.4}", skin.length());

    let domain = Domain::circle(
        Point2::new(0.5, 0.0),
        config.farfield(),
        config.ext_mesh_size(),
    )?;

    let clearance = domain.bounding_clearance(&[&skin]);
    let schedule = BoundaryLayerSpec::new(config.first_layer(), config.ratio(), config.nb_layers())
        .plan(clearance, config.airfoil_mesh_size())?;

    let mut session = RecordingSession::new();
    let holes = [Hole {
        name: "airfoil",
        contour: &skin,
    }];
    let model = assemble(&mut session, &domain, &holes, Some(&schedule), None)?;

    session.generate_mesh()?;
    let path = mesh_file_name(Path::new(config.output()), "naca0012", false, config.format());
    session.write(&path)?;

    if let Ok(json) = serde_json::to_string_pretty(&model) {
        log::debug!("tagged model: {}", json);
    }
    for group in &model.groups {
        log::info!(
            "group '{}' (dim {}): {} entities",
            group.name,
            group.dim,
            group.entities.len()
        );
    }
    println!(
        "recorded {} points, {} curves, {} surfaces -> {}",
        session.point_count(),
        session.curve_count(),
        session.surface_count(),
        path.display()
    );

    Ok(())
}
