use fisheye_backend::cv::OpenCvOpener;
use fisheye_backend::session::Session;
use fisheye_backend::sink::open_virtual_camera;
use fisheye_ui::{fatal, Variant};

fn main() -> fisheye_ui::Result<()> {
    fisheye_ui::init_tracing();

    let variant = Variant::virtual_camera();
    let spec = variant
        .session
        .correction
        .as_ref()
        .and_then(|correction| correction.sink);
    let Some(spec) = spec else {
        fatal::exit(variant.title, "No virtual camera output is configured.");
    };

    let sink = match open_virtual_camera(spec) {
        Ok(sink) => sink,
        Err(err) => fatal::exit(
            variant.title,
            &format!(
                "Could not start the virtual camera. A v4l2loopback device is required.\n\n{err}"
            ),
        ),
    };

    let opener = OpenCvOpener::new(variant.session.capture_size);
    let session = Session::new(opener, variant.session.clone())?.with_sink(sink)?;

    fisheye_ui::run(variant, session)
}
