/// A request fixture fed to the decoder benchmarks.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    file: TestFile,
    delivery: Delivery,
}

impl TestCase {
    pub fn new(name: &'static str, file: TestFile, delivery: Delivery) -> Self {
        Self { name, file, delivery }
    }

    /// The whole request is available to the first decode call.
    pub fn whole(name: &'static str, file: TestFile) -> Self {
        Self::new(name, file, Delivery::Whole)
    }

    /// The request arrives in reads of `chunk` bytes.
    pub fn split(name: &'static str, file: TestFile, chunk: usize) -> Self {
        Self::new(name, file, Delivery::Split(chunk))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    /// End offsets of the read buffer after each simulated socket read.
    pub fn read_ends(&self) -> Vec<usize> {
        let len = self.file.content().len();
        match self.delivery {
            Delivery::Whole => vec![len],
            Delivery::Split(chunk) => (1..=len.div_ceil(chunk)).map(|i| (i * chunk).min(len)).collect(),
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Delivery {
    Whole,
    Split(usize),
}
