use log::{info, warn};

use crate::{docker::ContainerTool, image_ref::ImageNaming, images::Image, Result};

/// Pushes every image that exists locally. Images that were never built are skipped.
pub fn push(tool: &dyn ContainerTool, naming: &ImageNaming) -> Result<()> {
    for image in Image::ALL {
        push_image(tool, naming, image)?;
    }
    Ok(())
}

/// Returns whether the image was pushed.
pub fn push_image(tool: &dyn ContainerTool, naming: &ImageNaming, image: Image) -> Result<bool> {
    let reference = naming.reference(image.name());

    if !tool.image_exists(&reference)? {
        warn!("{reference} image not found. Skipping push for this image.");
        return Ok(false);
    }

    info!("Pushing {reference}...");
    tool.push(&reference).map_err(|error| {
        format!(
            "Failed to push {name} Docker image: {error}",
            name = image.name()
        )
    })?;
    info!("Pushed {reference}");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::testing::{Call, RecordingTool};

    fn naming() -> ImageNaming {
        ImageNaming::new(
            Some("docker.io/myrepo".to_string()),
            Some("v2.3.0".to_string()),
        )
    }

    #[test]
    fn pushes_existing_images_and_skips_the_rest() {
        let tool = RecordingTool {
            existing: vec![
                "docker.io/myrepo/spark:v2.3.0".to_string(),
                "docker.io/myrepo/spark-r:v2.3.0".to_string(),
            ],
            ..Default::default()
        };

        push(&tool, &naming()).unwrap();

        assert_eq!(
            *tool.calls.borrow(),
            [
                Call::ImageExists("docker.io/myrepo/spark:v2.3.0".to_string()),
                Call::Push("docker.io/myrepo/spark:v2.3.0".to_string()),
                Call::ImageExists("docker.io/myrepo/spark-py:v2.3.0".to_string()),
                Call::ImageExists("docker.io/myrepo/spark-r:v2.3.0".to_string()),
                Call::Push("docker.io/myrepo/spark-r:v2.3.0".to_string()),
            ]
        );
    }

    #[test]
    fn nothing_to_push_is_not_an_error() {
        let tool = RecordingTool::default();
        push(&tool, &naming()).unwrap();
        assert!(tool.pushed().is_empty());
        assert_eq!(tool.calls.borrow().len(), 3);
    }

    #[test]
    fn failing_push_halts_the_sequence() {
        let tool = RecordingTool {
            existing: vec![
                "docker.io/myrepo/spark:v2.3.0".to_string(),
                "docker.io/myrepo/spark-py:v2.3.0".to_string(),
                "docker.io/myrepo/spark-r:v2.3.0".to_string(),
            ],
            failing_push: Some("docker.io/myrepo/spark-py:v2.3.0".to_string()),
            ..Default::default()
        };

        let error = push(&tool, &naming()).unwrap_err().to_string();

        assert!(
            error.starts_with("Failed to push spark-py Docker image"),
            "{error}"
        );
        assert_eq!(
            tool.pushed(),
            [
                "docker.io/myrepo/spark:v2.3.0",
                "docker.io/myrepo/spark-py:v2.3.0",
            ]
        );
    }

    #[test]
    fn push_image_reports_whether_it_pushed() {
        let tool = RecordingTool {
            existing: vec!["docker.io/myrepo/spark:v2.3.0".to_string()],
            ..Default::default()
        };
        assert!(push_image(&tool, &naming(), Image::Spark).unwrap());
        assert!(!push_image(&tool, &naming(), Image::PySpark).unwrap());
    }
}
