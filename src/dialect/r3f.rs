//! JSX for react-three-fiber, with drei helpers and leva controls.

use super::{AttrValue, Attribute, Dialect, Scope};
use crate::{
    assembly::{HostShell, ImportNeeds, ModelShell},
    context::ContextValue,
    controls::{ControlSet, RigKind},
    naming::{object_key, quote_single},
    numeric::{Canonicalizer, Numeric, PiRelation, format_decimal},
    types_emit::{TypeDescriptors, TypeShape},
};

const INDENT: &str = "  ";
const DEFAULT_CONTEXT: &str = "defaultContext";
const STORAGE_KEY: &str = "STORAGE_KEY";

/// Same-shape overlay of a saved blob onto the defaults, mirroring
/// `ContextValue::apply_saved`.
const APPLY_SAVED_BODY: &str = r#"  if (!saved || typeof saved !== 'object') return
  for (const key of Object.keys(target)) {
    if (!(key in saved)) continue
    const current = target[key]
    const value = saved[key]
    if (Array.isArray(current)) {
      if (Array.isArray(value) && value.length === current.length && value.every((v) => typeof v === 'number')) {
        target[key] = value
      } else if (typeof value === 'number') {
        target[key] = current.map(() => value)
      }
    } else if (current !== null && typeof current === 'object') {
      applySaved(current, value)
    } else if (typeof value === typeof current) {
      target[key] = value
    }
  }
"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReactThreeFiber;

fn indent(text: &str, depth: usize) -> String {
    let pad = INDENT.repeat(depth);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                "\n".to_string()
            } else {
                format!("{pad}{line}\n")
            }
        })
        .collect()
}

fn attribute(attr: &Attribute) -> String {
    match &attr.value {
        AttrValue::Flag => attr.name.clone(),
        AttrValue::Text(t) if t.contains(['"', '\n']) => {
            format!("{}={{{}}}", attr.name, quote_single(t))
        }
        AttrValue::Text(t) => format!("{}=\"{}\"", attr.name, t),
        AttrValue::Expr(e) => format!("{}={{{}}}", attr.name, e),
    }
}

impl ReactThreeFiber {
    fn value_literal(&self, value: &ContextValue, canon: &Canonicalizer, depth: usize) -> String {
        match value {
            ContextValue::Number(v) => self.numeric(canon.value(*v)),
            ContextValue::Bool(v) => v.to_string(),
            ContextValue::Text(v) => self.string_literal(v),
            ContextValue::Vector { values, angular } => {
                let items: Vec<String> = values
                    .iter()
                    .map(|&v| {
                        if *angular {
                            self.numeric(canon.angle(v))
                        } else {
                            self.numeric(canon.value(v))
                        }
                    })
                    .collect();
                self.vector(&items)
            }
            ContextValue::Group(entries) if entries.is_empty() => "{}".to_string(),
            ContextValue::Group(entries) => {
                let pad = INDENT.repeat(depth + 1);
                let mut out = String::from("{\n");
                for (key, v) in entries {
                    out.push_str(&format!(
                        "{pad}{}: {},\n",
                        object_key(key),
                        self.value_literal(v, canon, depth + 1)
                    ));
                }
                out.push_str(&INDENT.repeat(depth));
                out.push('}');
                out
            }
        }
    }

    fn type_shape_at(&self, shape: &TypeShape, depth: usize) -> String {
        match shape {
            TypeShape::Number => "number".to_string(),
            TypeShape::Boolean => "boolean".to_string(),
            TypeShape::String => "string".to_string(),
            TypeShape::Tuple(n) => format!("[{}]", vec!["number"; *n].join(", ")),
            TypeShape::Object(entries) if entries.is_empty() => "{}".to_string(),
            TypeShape::Object(entries) => {
                let pad = INDENT.repeat(depth + 1);
                let mut out = String::from("{\n");
                for (key, ty) in entries {
                    out.push_str(&format!(
                        "{pad}{}: {}\n",
                        object_key(key),
                        self.type_shape_at(ty, depth + 1)
                    ));
                }
                out.push_str(&INDENT.repeat(depth));
                out.push('}');
                out
            }
        }
    }

    fn context_path(&self, path: &[String]) -> String {
        self.path(self.scope(Scope::Context), path)
    }

    fn bound(&self, value: f64, angular: bool, canon: &Canonicalizer) -> String {
        if angular {
            self.numeric(canon.angle(value))
        } else {
            format_decimal(value)
        }
    }

    fn loader(&self, asset_url: &str, decoder: Option<&str>) -> String {
        match decoder {
            Some(decoder) => format!("useGLTF({}, {decoder})", self.string_literal(asset_url)),
            None => format!("useGLTF({})", self.string_literal(asset_url)),
        }
    }

    fn material_sync_block(&self, controls: &ControlSet, typed: bool) -> String {
        let (nodes_ty, ctx_ty) = if typed {
            (": GLTFResult['nodes']", ": SceneContext")
        } else {
            ("", "")
        };
        let mut out = format!("function useMaterialSync(nodes{nodes_ty}, ctx{ctx_ty}) {{\n");
        out.push_str("  useFrame(() => {\n");
        for (i, sync) in controls.material_sync.iter().enumerate() {
            let local = format!("material{i}");
            let live = self.member(&self.scoped(Scope::Nodes, &sync.owner), "material");
            let cast = match typed {
                false => "",
                true if sync.fields.iter().any(|f| f.starts_with("clearcoat")) => {
                    " as THREE.MeshPhysicalMaterial"
                }
                true => " as THREE.MeshStandardMaterial",
            };
            out.push_str(&format!("    const {local} = {live}{cast}\n"));
            let source = self.context_path(&sync.path);
            for field in &sync.fields {
                let value = self.member(&source, field);
                if field == "color" {
                    out.push_str(&format!("    {local}.color.set({value})\n"));
                } else {
                    out.push_str(&format!("    {local}.{field} = {value}\n"));
                }
            }
        }
        out.push_str("  })\n}\n");
        out
    }
}

impl Dialect for ReactThreeFiber {
    fn scope(&self, scope: Scope) -> &str {
        match scope {
            Scope::Nodes => "nodes",
            Scope::Materials => "materials",
            Scope::Instances => "instances",
            Scope::Context => "ctx",
        }
    }

    fn string_literal(&self, text: &str) -> String {
        quote_single(text)
    }

    fn numeric(&self, value: Numeric) -> String {
        match value {
            Numeric::Decimal(v) => format_decimal(v),
            Numeric::Pi { negative, relation } => {
                let sign = if negative { "-" } else { "" };
                match relation {
                    PiRelation::Unit => format!("{sign}Math.PI"),
                    PiRelation::Div(n) => format!("{sign}Math.PI / {n}"),
                    PiRelation::Mul(n) => format!("{sign}Math.PI * {n}"),
                }
            }
        }
    }

    fn vector(&self, items: &[String]) -> String {
        format!("[{}]", items.join(", "))
    }

    fn json(&self, value: &serde_json::Value) -> String {
        value.to_string()
    }

    fn comment(&self, text: &str) -> String {
        let mut out = String::from("/*\n");
        for line in text.replace("*/", "*\\/").lines() {
            out.push_str(&format!(" * {line}\n"));
        }
        out.push_str(" */\n");
        out
    }

    fn element(&self, tag: &str, attrs: &[Attribute], children: &str) -> String {
        let mut open = format!("<{tag}");
        for attr in attrs {
            open.push(' ');
            open.push_str(&attribute(attr));
        }
        if children.is_empty() {
            format!("{open} />\n")
        } else {
            format!("{open}>\n{}</{tag}>\n", indent(children, 1))
        }
    }

    fn live_reference(&self, node_expr: &str) -> String {
        format!("<primitive object={{{node_expr}}} />\n")
    }

    fn context_literal(&self, value: &ContextValue, canon: &Canonicalizer) -> String {
        format!(
            "const {DEFAULT_CONTEXT} = {}\n",
            self.value_literal(value, canon, 0)
        )
    }

    fn type_shape(&self, shape: &TypeShape) -> String {
        self.type_shape_at(shape, 0)
    }

    fn type_block(&self, types: &TypeDescriptors) -> String {
        let mut out = String::from("type GLTFResult = GLTF & {\n  nodes: {\n");
        for (name, ty) in &types.nodes {
            out.push_str(&format!("    {}: THREE.{ty}\n", object_key(name)));
        }
        out.push_str("  }\n  materials: {\n");
        for (name, ty) in &types.materials {
            out.push_str(&format!("    {}: THREE.{ty}\n", object_key(name)));
        }
        out.push_str("  }\n");
        if types.clips.is_empty() {
            out.push_str("  animations: THREE.AnimationClip[]\n}\n");
        } else {
            out.push_str("  animations: GLTFAction[]\n}\n\n");
            let names: Vec<String> = types.clips.iter().map(|c| quote_single(c)).collect();
            out.push_str(&format!("type ActionName = {}\n\n", names.join(" | ")));
            out.push_str("interface GLTFAction extends THREE.AnimationClip {\n  name: ActionName\n}\n");
        }
        out.push_str(&format!(
            "\ntype SceneContext = {}\n",
            self.type_shape(&types.context)
        ));
        out
    }

    fn control_block(&self, controls: &ControlSet, canon: &Canonicalizer, typed: bool) -> String {
        let ctx_ty = if typed { ": SceneContext" } else { "" };
        let mut out = format!("function useSceneControls(ctx{ctx_ty}) {{\n");
        for group in &controls.groups {
            let base = self.context_path(&group.path);
            out.push_str(&format!(
                "  const {} = useControls(\n    {},\n    {{\n",
                group.binding,
                self.string_literal(&group.title)
            ));
            for field in &group.fields {
                let value = self.member(&base, &field.name);
                let key = object_key(&field.name);
                match field.range {
                    Some(r) => out.push_str(&format!(
                        "      {key}: {{ value: {value}, min: {}, max: {}, step: {} }},\n",
                        self.bound(r.min, r.angular, canon),
                        self.bound(r.max, r.angular, canon),
                        format_decimal(r.step)
                    )),
                    None => out.push_str(&format!("      {key}: {value},\n")),
                }
            }
            out.push_str("    },\n    { collapsed: true },\n  )\n");
        }

        out.push('\n');
        for sync in controls.context_sync() {
            let target = self.member(&self.context_path(sync.path), sync.field);
            let source = self.member(sync.binding, sync.field);
            out.push_str(&format!("  {target} = {source}\n"));
        }

        let bindings: Vec<&str> = controls.groups.iter().map(|g| g.binding.as_str()).collect();
        out.push_str(&format!("  return {{ {} }}\n}}\n\n", bindings.join(", ")));
        out.push_str(&self.material_sync_block(controls, typed));
        out
    }

    fn imports(&self, needs: &ImportNeeds) -> String {
        let mut out = String::new();
        if needs.typed {
            out.push_str("import * as THREE from 'three'\n");
        }

        let mut react = vec!["Suspense", "useEffect", "useState"];
        if needs.animations {
            react.push("useRef");
        }
        react.sort_unstable();
        out.push_str(&format!(
            "import React, {{ {} }} from 'react'\n",
            react.join(", ")
        ));
        out.push_str("import { Canvas, useFrame } from '@react-three/fiber'\n");

        let mut drei: Vec<&str> = vec!["useGLTF"];
        if needs.instancing {
            drei.push("Merged");
        }
        if needs.animations {
            drei.push("useAnimations");
        }
        drei.extend(needs.cameras.iter().map(String::as_str));
        if needs.clouds {
            drei.push("Cloud");
        }
        if needs.stars {
            drei.push("Stars");
        }
        drei.push("OrbitControls");
        out.push_str(&format!(
            "import {{ {} }} from '@react-three/drei'\n",
            drei.join(", ")
        ));

        if needs.typed {
            out.push_str("import { GLTF } from 'three-stdlib'\n");
        }
        out.push_str("import { useControls } from 'leva'\n");
        out
    }

    fn model_block(&self, shell: &ModelShell<'_>) -> String {
        let loader = self.loader(shell.asset_url, shell.decoder);
        let cast = if shell.typed { " as GLTFResult" } else { "" };
        let mut out = String::new();

        if !shell.instances.is_empty() {
            if shell.typed {
                out.push_str(
                    "type ContextType = Record<string, React.ForwardRefExoticComponent<JSX.IntrinsicElements['mesh']>>\n\n",
                );
                out.push_str("const context = React.createContext({} as ContextType)\n\n");
                out.push_str(
                    "export function Instances({ children, ...props }: JSX.IntrinsicElements['group']) {\n",
                );
            } else {
                out.push_str("const context = React.createContext()\n\n");
                out.push_str("export function Instances({ children, ...props }) {\n");
            }
            out.push_str(&format!("  const {{ nodes }} = {loader}{cast}\n"));
            out.push_str("  const instances = React.useMemo(\n    () => ({\n");
            for instance in shell.instances {
                out.push_str(&format!(
                    "      {}: {},\n",
                    object_key(&instance.name),
                    self.scoped(Scope::Nodes, &instance.owner)
                ));
            }
            out.push_str("    }),\n    [nodes],\n  )\n");
            out.push_str("  return (\n    <Merged meshes={instances} {...props}>\n");
            let param = if shell.typed {
                "(instances: ContextType)"
            } else {
                "(instances)"
            };
            out.push_str(&format!(
                "      {{{param} => <context.Provider value={{instances}} children={{children}} />}}\n"
            ));
            out.push_str("    </Merged>\n  )\n}\n\n");
        }

        if let Some(dump) = shell.debug_dump {
            out.push_str(&self.comment(dump));
        }

        let props_ty = if shell.typed {
            ": JSX.IntrinsicElements['group'] & { ctx: SceneContext }"
        } else {
            ""
        };
        out.push_str(&format!(
            "export function {}({{ ctx, ...props }}{props_ty}) {{\n",
            shell.component
        ));
        if shell.animated {
            let ref_ty = if shell.typed { "<THREE.Group>" } else { "" };
            out.push_str(&format!("  const group = useRef{ref_ty}(null)\n"));
            out.push_str(&format!(
                "  const {{ nodes, materials, animations }} = {loader}{cast}\n"
            ));
            out.push_str("  const { actions } = useAnimations(animations, group)\n");
        } else {
            out.push_str(&format!("  const {{ nodes, materials }} = {loader}{cast}\n"));
        }
        if !shell.instances.is_empty() {
            out.push_str("  const instances = React.useContext(context)\n");
        }
        out.push_str("  useMaterialSync(nodes, ctx)\n");

        let model = self.context_path(shell.model_path);
        let mut attrs = Vec::new();
        if shell.animated {
            attrs.push(Attribute::expr("ref", "group"));
        }
        attrs.push(Attribute::flag("{...props}"));
        for field in ["position", "rotation", "scale"] {
            attrs.push(Attribute::expr(field, self.member(&model, field)));
        }
        attrs.push(Attribute::expr("dispose", "null"));
        out.push_str("  return (\n");
        out.push_str(&indent(&self.element("group", &attrs, shell.tree), 2));
        out.push_str("  )\n}\n\n");
        out.push_str(&format!(
            "useGLTF.preload({})\n",
            self.string_literal(shell.asset_url)
        ));
        out
    }

    fn host_block(&self, shell: &HostShell<'_>) -> String {
        let any = if shell.typed { ": any" } else { "" };
        let ctx_ty = if shell.typed { ": SceneContext" } else { "" };
        let mut out = format!(
            "const {STORAGE_KEY} = {}\n\n",
            self.string_literal(shell.storage_key)
        );

        out.push_str(&format!("function applySaved(target{any}, saved{any}) {{\n"));
        out.push_str(APPLY_SAVED_BODY);
        out.push_str("}\n\n");

        out.push_str(&format!("function loadContext(){ctx_ty} {{\n"));
        out.push_str(&format!("  const ctx = structuredClone({DEFAULT_CONTEXT})\n"));
        out.push_str("  try {\n");
        out.push_str(&format!(
            "    applySaved(ctx, JSON.parse(window.localStorage.getItem({STORAGE_KEY}) ?? 'null'))\n"
        ));
        out.push_str("  } catch {\n    // unreadable blob: keep defaults\n  }\n  return ctx\n}\n\n");

        out.push_str(&format!("function saveContext(ctx{ctx_ty}) {{\n"));
        out.push_str(&format!(
            "  window.localStorage.setItem({STORAGE_KEY}, JSON.stringify(ctx))\n}}\n\n"
        ));

        out.push_str("export default function App() {\n");
        out.push_str("  const [ctx] = useState(loadContext)\n");
        out.push_str("  useSceneControls(ctx)\n");
        out.push_str("  useEffect(() => saveContext(ctx))\n");

        let mut scene = String::new();
        let mut style = None;
        for group in &shell.controls.groups {
            let values = self.context_path(&group.path);
            match group.kind {
                RigKind::PointLight => scene.push_str(&format!("<pointLight {{...{values}}} />\n")),
                RigKind::SpotLight => scene.push_str(&format!("<spotLight {{...{values}}} />\n")),
                RigKind::Cloud => scene.push_str(&format!("<Cloud {{...{values}}} />\n")),
                RigKind::Stars => scene.push_str(&format!("<Stars {{...{values}}} />\n")),
                RigKind::Background => style = Some(values),
                RigKind::Model | RigKind::Material => {}
            }
        }

        let model = format!("<{} ctx={{ctx}} />\n", shell.component);
        let model = if shell.instancing {
            format!("<Instances>\n{}</Instances>\n", indent(&model, 1))
        } else {
            model
        };
        scene.push_str(&format!("<Suspense fallback={{null}}>\n{}</Suspense>\n", indent(&model, 1)));
        scene.push_str("<OrbitControls makeDefault />\n");

        let canvas_attrs = match &style {
            Some(bg) => {
                out.push_str(&format!(
                    "  const background = {bg}.gradient\n    ? `linear-gradient(${{{bg}.top}}, ${{{bg}.bottom}})`\n    : {bg}.top\n"
                ));
                " style={{ background }}"
            }
            None => "",
        };
        out.push_str("  return (\n");
        out.push_str(&format!("    <Canvas{canvas_attrs}>\n"));
        out.push_str(&indent(&scene, 3));
        out.push_str("    </Canvas>\n  )\n}\n");
        out
    }
}
