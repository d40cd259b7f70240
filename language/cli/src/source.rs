use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use data::tokens::Token;
use data::{Readable, SourceSet};

/// A directory of `.rv` source files, walked recursively, implementing the
/// richer `Readable`/`SourceSet` contract `language/data` owns.
#[derive(Clone, Debug)]
pub struct FileSourceSet {
    pub root: PathBuf,
}

impl FileSourceSet {
    pub fn new(root: PathBuf) -> Self {
        return Self { root };
    }

    fn read_recursive(&self, path: &Path, out: &mut Vec<Box<dyn Readable>>) {
        let metadata = fs::metadata(path).unwrap_or_else(|error| panic!("cannot read {}: {error}", path.display()));
        if metadata.is_dir() {
            for entry in fs::read_dir(path).unwrap_or_else(|error| panic!("cannot read directory {}: {error}", path.display())) {
                let entry = entry.unwrap_or_else(|error| panic!("cannot read directory entry: {error}"));
                self.read_recursive(&entry.path(), out);
            }
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("rv") {
            out.push(Box::new(FileReadable { path: path.to_path_buf() }));
        }
    }
}

impl SourceSet for FileSourceSet {
    fn get_files(&self) -> Vec<Box<dyn Readable>> {
        let mut out = Vec::new();
        self.read_recursive(&self.root, &mut out);
        return out;
    }

    fn relative(&self, other: &dyn Readable) -> String {
        let path = PathBuf::from(other.path());
        let relative = path.strip_prefix(&self.root).unwrap_or(&path);
        let without_extension = relative.with_extension("");
        return without_extension.components().map(|component| component.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("::");
    }

    fn cloned(&self) -> Box<dyn SourceSet> {
        return Box::new(self.clone());
    }
}

#[derive(Clone, Debug)]
struct FileReadable {
    path: PathBuf,
}

impl Readable for FileReadable {
    fn read(&self) -> Vec<Token> {
        return parser::Lexer::new(&self.contents()).tokenize();
    }

    fn contents(&self) -> String {
        return fs::read_to_string(&self.path).unwrap_or_else(|error| panic!("cannot read {}: {error}", self.path.display()));
    }

    fn path(&self) -> String {
        return self.path.to_string_lossy().into_owned();
    }

    fn hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.path.hash(&mut hasher);
        return hasher.finish();
    }
}
