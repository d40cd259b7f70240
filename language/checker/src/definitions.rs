use std::collections::HashMap;

use syntax::ast::{ConstDecl, FunctionDecl, Program, StructDecl};

/// Name-indexed view over the raw parse tree, built once up front. Atlas
/// entries for anything but `main` don't exist until C3 creates
/// specializations; this is how C1's worklist and C3's specializer look up
/// the declaration behind a bare source-level name.
pub struct Definitions<'a> {
    pub functions: HashMap<String, &'a FunctionDecl>,
    pub structs: HashMap<String, &'a StructDecl>,
    pub consts: HashMap<String, &'a ConstDecl>,
}

impl<'a> Definitions<'a> {
    pub fn collect(program: &'a Program) -> Self {
        let mut functions = HashMap::new();
        for function in &program.functions {
            functions.insert(function.name.clone(), function);
        }
        let mut structs = HashMap::new();
        for structure in &program.structs {
            structs.insert(structure.name.clone(), structure);
        }
        let mut consts = HashMap::new();
        for const_decl in &program.consts {
            consts.insert(const_decl.name.clone(), const_decl);
        }
        return Self { functions, structs, consts };
    }
}
