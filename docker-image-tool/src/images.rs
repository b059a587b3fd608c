#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Image {
    /// The JVM runtime image every other image is layered on.
    Spark,
    /// Adds the Python runtime on top of [`Image::Spark`].
    PySpark,
    /// Adds the R runtime on top of [`Image::Spark`].
    SparkR,
}

impl Image {
    pub const ALL: [Image; 3] = [Image::Spark, Image::PySpark, Image::SparkR];

    pub const fn name(&self) -> &'static str {
        match self {
            Image::Spark => "spark",
            Image::PySpark => "spark-py",
            Image::SparkR => "spark-r",
        }
    }

    /// Human readable name used in progress and error messages.
    pub const fn label(&self) -> &'static str {
        match self {
            Image::Spark => "Spark JVM",
            Image::PySpark => "PySpark",
            Image::SparkR => "SparkR",
        }
    }
}
