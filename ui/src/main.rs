use fisheye_backend::cv::OpenCvOpener;
use fisheye_backend::session::Session;
use fisheye_ui::Variant;

fn main() -> fisheye_ui::Result<()> {
    fisheye_ui::init_tracing();

    let variant = Variant::preview();
    let opener = OpenCvOpener::new(variant.session.capture_size);
    let session = Session::new(opener, variant.session.clone())?;

    fisheye_ui::run(variant, session)
}
